//! Page/limit validation and upstream offset arithmetic.

use crate::domain::SearchError;

/// Highest 1-based record offset the discovery API will serve.
pub const MAX_OFFSET: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    /// 1-based index of the first record on the page
    pub offset: u32,
}

#[derive(Debug, Clone)]
pub struct Paginator {
    default_per_page: u32,
    max_per_page: u32,
    max_offset: u64,
}

impl Paginator {
    pub fn new(default_per_page: u32, max_per_page: u32) -> Self {
        Self {
            default_per_page,
            max_per_page,
            max_offset: MAX_OFFSET,
        }
    }

    pub fn max_per_page(&self) -> u32 {
        self.max_per_page
    }

    /// Validate raw `page` and `perpage` values. Absent or blank values
    /// take their defaults (page 1, configured page size).
    pub fn validate(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Result<Pagination, SearchError> {
        let page = match non_blank(page) {
            None => 1,
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                SearchError::InvalidPage(format!("Invalid page number '{}': must be an integer", raw))
            })?,
        };
        if page < 1 {
            return Err(SearchError::InvalidPage(
                "Page number must be a positive integer".to_string(),
            ));
        }

        let limit = match non_blank(limit) {
            None => i64::from(self.default_per_page),
            Some(raw) => raw.parse::<i64>().map_err(|_| {
                SearchError::InvalidLimit(format!(
                    "Invalid results per page value '{}': must be an integer",
                    raw
                ))
            })?,
        };
        if limit < 1 {
            return Err(SearchError::InvalidLimit(
                "Results per page must be a positive integer".to_string(),
            ));
        }
        if limit > i64::from(self.max_per_page) {
            return Err(SearchError::InvalidLimit(format!(
                "Results per page cannot exceed {}",
                self.max_per_page
            )));
        }

        // page >= 1 and 1 <= limit <= max_per_page, so both fit in u64.
        let offset = (page as u64 - 1)
            .checked_mul(limit as u64)
            .and_then(|o| o.checked_add(1))
            .unwrap_or(u64::MAX);
        if offset > self.max_offset {
            return Err(SearchError::OffsetExceeded {
                offset,
                max: self.max_offset,
            });
        }

        // offset <= max_offset bounds page as well.
        Ok(Pagination {
            page: page as u32,
            limit: limit as u32,
            offset: offset as u32,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
