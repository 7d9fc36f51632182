//! Inbound request and outbound response shapes of the search endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::SearchError;

/// Search parameters exactly as the widget sent them.
///
/// Numbers stay as text so that malformed values are reported by the
/// pagination stage instead of being rejected by the extractor.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "q")]
    pub query: Option<String>,
    pub page: Option<String>,
    pub perpage: Option<String>,
    pub sort: Option<String>,
    /// Taken from the `Referer` header, never from the query string
    #[serde(skip)]
    pub referrer: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Build from decoded query-string pairs. When a parameter repeats, the
    /// first occurrence wins; unknown parameters are ignored.
    pub fn from_query_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut request = Self::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "q" => &mut request.query,
                "page" => &mut request.page,
                "perpage" => &mut request.perpage,
                "sort" => &mut request.sort,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        request
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_perpage(mut self, perpage: impl Into<String>) -> Self {
        self.perpage = Some(perpage.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

/// Sort selected for a request, in both vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedSort {
    pub field: &'static str,
    pub dir: &'static str,
    /// Value sent as `orderBy` to the upstream
    pub upstream: &'static str,
}

/// A request that passed every validation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub cleaned_query: String,
    pub page: u32,
    pub limit: u32,
    pub offset: u32,
    pub library_symbol: String,
    pub sort: AppliedSort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortEcho {
    pub field: String,
    pub dir: String,
}

impl From<AppliedSort> for SortEcho {
    fn from(sort: AppliedSort) -> Self {
        Self {
            field: sort.field.to_string(),
            dir: sort.dir.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortOption {
    pub field: String,
    pub dir: String,
    pub label: String,
}

/// One record in the shape the widget renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormattedResult {
    pub title: String,
    pub ocn: String,
    pub url: String,
    pub author: String,
    pub date: String,
    pub publisher: String,
    pub identifier: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub total_results: u64,
    pub perpage: usize,
    pub sort: SortEcho,
    pub sort_options: Vec<SortOption>,
    pub results: Vec<FormattedResult>,
}

/// Body returned on every failure path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub total_results: u64,
    pub results: Vec<FormattedResult>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            total_results: 0,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchPayload {
    Results(SearchResponse),
    Error(ErrorResponse),
}

/// Outcome of one pass through the search pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReply {
    #[serde(skip)]
    pub status: u16,
    #[serde(flatten)]
    pub payload: SearchPayload,
}

impl SearchReply {
    pub fn ok(response: SearchResponse) -> Self {
        Self {
            status: 200,
            payload: SearchPayload::Results(response),
        }
    }

    pub fn from_error(err: &SearchError) -> Self {
        Self {
            status: err.status_code(),
            payload: SearchPayload::Error(ErrorResponse::new(err.public_message())),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.payload {
            SearchPayload::Error(e) => Some(&e.error),
            SearchPayload::Results(_) => None,
        }
    }

    pub fn response(&self) -> Option<&SearchResponse> {
        match &self.payload {
            SearchPayload::Results(r) => Some(r),
            SearchPayload::Error(_) => None,
        }
    }
}
