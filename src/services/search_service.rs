//! Search Service
//!
//! Runs one widget search end to end: validation, authentication, library
//! resolution, the upstream call and formatting. Each stage returns a
//! `Result` and the first failure ends the request. This is the only place
//! where a [`SearchError`] becomes a status code and an error body.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::domain::SearchError;
use crate::models::{BriefBibsQuery, SearchReply, SearchRequest, SearchResponse, ValidatedRequest};
use crate::modules::oclc::{CredentialCache, DATABASE_IDS, DiscoveryClient, DiscoveryError};
use crate::modules::query::{LibraryResolver, Paginator, QuerySanitizer, SortMapper};
use crate::modules::springshare::ResultFormatter;

pub struct SearchService {
    credentials: Arc<CredentialCache>,
    discovery: Arc<dyn DiscoveryClient>,
    sanitizer: QuerySanitizer,
    sorter: SortMapper,
    paginator: Paginator,
    resolver: LibraryResolver,
    formatter: ResultFormatter,
}

impl SearchService {
    pub fn new(
        credentials: Arc<CredentialCache>,
        discovery: Arc<dyn DiscoveryClient>,
        paginator: Paginator,
        resolver: LibraryResolver,
        formatter: ResultFormatter,
    ) -> Self {
        Self {
            credentials,
            discovery,
            sanitizer: QuerySanitizer::default(),
            sorter: SortMapper::new(),
            paginator,
            resolver,
            formatter,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: QuerySanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    /// Handle a search. Always produces a reply; panics inside the pipeline
    /// become a generic 500.
    pub async fn search(&self, request: SearchRequest) -> SearchReply {
        let outcome = AssertUnwindSafe(self.run(&request)).catch_unwind().await;

        match outcome {
            Ok(Ok(response)) => SearchReply::ok(response),
            Ok(Err(err)) => {
                match &err {
                    SearchError::Unexpected(detail) => {
                        tracing::error!("Unexpected error in search: {}", detail)
                    }
                    e if e.is_validation() => tracing::debug!("Rejected search: {}", e),
                    e => tracing::error!("Search failed: {}", e),
                }
                SearchReply::from_error(&err)
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Search pipeline panicked: {}", detail);
                SearchReply::from_error(&SearchError::Unexpected(detail))
            }
        }
    }

    async fn run(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let sort = self.sorter.map(request.sort.as_deref())?;
        let cleaned_query = self
            .sanitizer
            .sanitize(request.query.as_deref().unwrap_or_default())?;
        let pagination = self
            .paginator
            .validate(request.page.as_deref(), request.perpage.as_deref())?;

        let credential = self.credentials.get().await?;

        let library_symbol = self.resolver.resolve(request.referrer.as_deref());

        let validated = ValidatedRequest {
            cleaned_query,
            page: pagination.page,
            limit: pagination.limit,
            offset: pagination.offset,
            library_symbol,
            sort,
        };
        tracing::info!(
            "Searching '{}' page {} ({} per page) for {} sorted by {}",
            validated.cleaned_query,
            validated.page,
            validated.limit,
            validated.library_symbol,
            validated.sort.upstream
        );

        let query = BriefBibsQuery {
            q: validated.cleaned_query,
            offset: validated.offset,
            limit: validated.limit,
            held_by_symbol: validated.library_symbol.clone(),
            db_ids: DATABASE_IDS.to_string(),
            order_by: validated.sort.upstream.to_string(),
        };

        let body = match self.discovery.brief_bibs(&credential.token, &query).await {
            Ok(body) => body,
            Err(err) => return Err(self.upstream_failure(err).await),
        };

        Ok(self
            .formatter
            .format(&body, &validated.library_symbol, validated.sort))
    }

    async fn upstream_failure(&self, err: DiscoveryError) -> SearchError {
        match err {
            DiscoveryError::Timeout => SearchError::UpstreamTimeout,
            DiscoveryError::Status(401) => {
                // Token was revoked early; the next request fetches a new one.
                self.credentials.invalidate().await;
                SearchError::UpstreamRequestFailed(err.to_string())
            }
            DiscoveryError::Decode(detail) => SearchError::Unexpected(detail),
            other => SearchError::UpstreamRequestFailed(other.to_string()),
        }
    }
}
