//! Domain error types
//!
//! These errors are framework-agnostic and represent every way a search
//! request can fail. The search service is the only place that turns them
//! into an HTTP status and an error payload.

use std::fmt;

/// Message surfaced for failures whose detail must stay in the logs.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Query string could not be decoded at all
    InvalidParameters(String),
    /// Query is empty, either as sent or after sanitization
    EmptyQuery,
    /// Raw query is longer than the allowed number of characters
    QueryTooLong { max: usize },
    /// Sort parameter is not part of the external sort vocabulary
    InvalidSort(String),
    /// Page is not a positive integer
    InvalidPage(String),
    /// Results per page is not an integer in the allowed range
    InvalidLimit(String),
    /// Page and limit address records beyond what the upstream serves
    OffsetExceeded { offset: u64, max: u64 },
    /// No bearer token could be obtained, not even a stale one
    NoCredential,
    /// Upstream search call did not answer in time
    UpstreamTimeout,
    /// Upstream search call failed at the network or HTTP level
    UpstreamRequestFailed(String),
    /// Anything else; detail is logged, never returned to the caller
    Unexpected(String),
}

impl SearchError {
    pub fn status_code(&self) -> u16 {
        match self {
            SearchError::InvalidParameters(_)
            | SearchError::EmptyQuery
            | SearchError::QueryTooLong { .. }
            | SearchError::InvalidSort(_)
            | SearchError::InvalidPage(_)
            | SearchError::InvalidLimit(_)
            | SearchError::OffsetExceeded { .. } => 400,
            SearchError::NoCredential => 401,
            SearchError::UpstreamTimeout | SearchError::UpstreamRequestFailed(_) => 503,
            SearchError::Unexpected(_) => 500,
        }
    }

    /// Text for the `error` field of the response body.
    pub fn public_message(&self) -> String {
        match self {
            SearchError::Unexpected(_) => GENERIC_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.status_code() == 400
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidParameters(detail) => {
                write!(f, "Invalid search parameters: {}", detail)
            }
            SearchError::EmptyQuery => write!(f, "Search query cannot be empty"),
            SearchError::QueryTooLong { max } => {
                write!(f, "Query exceeds maximum length of {} characters", max)
            }
            SearchError::InvalidSort(msg) => write!(f, "{}", msg),
            SearchError::InvalidPage(msg) => write!(f, "{}", msg),
            SearchError::InvalidLimit(msg) => write!(f, "{}", msg),
            SearchError::OffsetExceeded { offset, max } => write!(
                f,
                "Requested page starts at record {}, beyond the maximum offset of {}",
                offset, max
            ),
            SearchError::NoCredential => write!(f, "Authentication failed"),
            SearchError::UpstreamTimeout => write!(f, "Request timed out"),
            SearchError::UpstreamRequestFailed(detail) => {
                write!(f, "Search request failed: {}", detail)
            }
            SearchError::Unexpected(detail) => write!(f, "Unexpected error: {}", detail),
        }
    }
}

impl std::error::Error for SearchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        assert_eq!(SearchError::EmptyQuery.status_code(), 400);
        assert_eq!(SearchError::QueryTooLong { max: 500 }.status_code(), 400);
        assert_eq!(SearchError::InvalidSort("x".into()).status_code(), 400);
        assert_eq!(
            SearchError::OffsetExceeded {
                offset: 10_001,
                max: 10_000
            }
            .status_code(),
            400
        );
        assert!(SearchError::InvalidLimit("x".into()).is_validation());
        assert!(SearchError::InvalidParameters("x".into()).is_validation());
    }

    #[test]
    fn upstream_errors_map_to_unavailable() {
        assert_eq!(SearchError::NoCredential.status_code(), 401);
        assert_eq!(SearchError::UpstreamTimeout.status_code(), 503);
        assert_eq!(
            SearchError::UpstreamRequestFailed("boom".into()).status_code(),
            503
        );
    }

    #[test]
    fn unexpected_error_detail_is_not_public() {
        let err = SearchError::Unexpected("db password leaked".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), GENERIC_ERROR_MESSAGE);
        assert!(err.to_string().contains("db password leaked"));
    }
}
