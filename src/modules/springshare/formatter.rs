//! Reshapes WorldCat brief records into the result format the Springshare
//! search widget renders, including the per-record deep link into the
//! library's WorldCat Discovery site.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::{
    AppliedSort, FormattedResult, SearchResponse, SortOption, UpstreamRecord, UpstreamSearch,
};

/// Titles in deep links are cut to this many words.
pub const MAX_TITLE_WORDS: usize = 20;

pub fn default_url_replace_chars() -> Vec<String> {
    ["-", "–", "—", "―"].iter().map(|c| c.to_string()).collect()
}

/// Replace every configured character with a space, collapse whitespace
/// and keep the first [`MAX_TITLE_WORDS`] words.
pub fn normalize_title_for_url(title: &str, replace_chars: &[String]) -> String {
    let mut processed = title.to_string();
    for pattern in replace_chars.iter().filter(|p| !p.is_empty()) {
        if processed.contains(pattern.as_str()) {
            processed = processed.replace(pattern.as_str(), " ");
        }
    }

    processed
        .split_whitespace()
        .take(MAX_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

fn sort_options() -> Vec<SortOption> {
    vec![
        SortOption {
            field: "relevancy".to_string(),
            dir: "desc".to_string(),
            label: "Most Relevant".to_string(),
        },
        SortOption {
            field: "title".to_string(),
            dir: "asc".to_string(),
            label: "Title A-Z".to_string(),
        },
    ]
}

#[derive(Debug, Clone)]
pub struct ResultFormatter {
    site_mappings: HashMap<String, String>,
    default_site: String,
    replace_chars: Vec<String>,
    default_per_page: usize,
}

impl ResultFormatter {
    pub fn new(
        site_mappings: HashMap<String, String>,
        default_site: impl Into<String>,
        replace_chars: Vec<String>,
        default_per_page: usize,
    ) -> Self {
        Self {
            site_mappings,
            default_site: default_site.into(),
            replace_chars,
            default_per_page,
        }
    }

    /// Discovery site hosting the library's catalogue.
    pub fn site_for(&self, library_symbol: &str) -> &str {
        match self.site_mappings.get(library_symbol) {
            Some(site) if !site.is_empty() => site,
            _ => {
                tracing::warn!(
                    "No site mapping for symbol '{}', using default site {}",
                    library_symbol,
                    self.default_site
                );
                &self.default_site
            }
        }
    }

    pub fn record_url(&self, title: &str, site: &str) -> String {
        let normalized = normalize_title_for_url(title, &self.replace_chars);
        // `/` stays literal, as in "Title / statement of responsibility".
        let encoded = urlencoding::encode(&format!("ti:{}", normalized)).replace("%2F", "/");
        format!("https://{}.on.worldcat.org/search?queryString={}", site, encoded)
    }

    /// Format a raw upstream body. Never fails: a body that does not look
    /// like a brief-bibs response yields an empty, well-formed response.
    pub fn format(&self, upstream: &Value, library_symbol: &str, sort: AppliedSort) -> SearchResponse {
        match serde_json::from_value::<UpstreamSearch>(upstream.clone()) {
            Ok(search) => self.format_search(&search, library_symbol, sort),
            Err(e) => {
                tracing::error!("Error formatting results: {}", e);
                self.empty(sort)
            }
        }
    }

    pub fn format_search(
        &self,
        search: &UpstreamSearch,
        library_symbol: &str,
        sort: AppliedSort,
    ) -> SearchResponse {
        let perpage = search.brief_records.len().min(self.default_per_page);
        let site = self.site_for(library_symbol);

        let results = search
            .brief_records
            .iter()
            .take(perpage)
            .map(|record| self.format_record(record, site))
            .collect();

        SearchResponse {
            total_results: search.number_of_records,
            perpage,
            sort: sort.into(),
            sort_options: sort_options(),
            results,
        }
    }

    fn format_record(&self, record: &UpstreamRecord, site: &str) -> FormattedResult {
        FormattedResult {
            title: record.title.clone(),
            ocn: record.oclc_number.clone(),
            url: self.record_url(&record.title, site),
            author: record.creator.clone(),
            date: record.date.clone(),
            publisher: record.publisher.clone(),
            identifier: record.identifier().unwrap_or_default().to_string(),
            format: record.general_format.clone(),
        }
    }

    fn empty(&self, sort: AppliedSort) -> SearchResponse {
        SearchResponse {
            total_results: 0,
            perpage: self.default_per_page,
            sort: sort.into(),
            sort_options: sort_options(),
            results: Vec::new(),
        }
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(HashMap::new(), "worldcat", default_url_replace_chars(), 10)
    }
}
