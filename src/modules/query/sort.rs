//! Translation of the widget's `field_direction` sort vocabulary into the
//! upstream `orderBy` enum.

use crate::domain::SearchError;
use crate::models::AppliedSort;

/// Every value the upstream accepts for `orderBy`.
pub const UPSTREAM_SORT_VALUES: &[&str] = &[
    "library",
    "recency",
    "bestMatch",
    "creator",
    "publicationDateAsc",
    "publicationDateDesc",
    "mostWidelyHeld",
    "title",
];

pub const DEFAULT_SORT: AppliedSort = AppliedSort {
    field: "relevancy",
    dir: "desc",
    upstream: "bestMatch",
};

/// Field -> allowed directions -> upstream value.
const SORT_TABLE: &[(&str, &[(&str, &str)])] = &[
    ("relevancy", &[("desc", "bestMatch")]),
    ("title", &[("asc", "title"), ("desc", "title desc")]),
    (
        "date",
        &[("asc", "publicationDateAsc"), ("desc", "publicationDateDesc")],
    ),
    ("library", &[("asc", "library")]),
    ("creator", &[("asc", "creator")]),
    ("popularity", &[("desc", "mostWidelyHeld")]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SortMapper;

impl SortMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map a widget sort parameter. Absent, blank and `_` all select the
    /// upstream default.
    pub fn map(&self, sort: Option<&str>) -> Result<AppliedSort, SearchError> {
        let sort = match sort.map(str::trim) {
            None | Some("") | Some("_") | Some("relevancy_desc") => return Ok(DEFAULT_SORT),
            Some(s) => s,
        };

        let parts: Vec<&str> = sort.split('_').collect();
        let [field, dir] = parts.as_slice() else {
            return Err(SearchError::InvalidSort(format!(
                "Invalid sort option '{}'. Must be one of: {}",
                sort,
                valid_choices()
            )));
        };

        let Some((field, directions)) = SORT_TABLE.iter().find(|(name, _)| name == field) else {
            return Err(SearchError::InvalidSort(format!(
                "Invalid sort field '{}'. Must be one of: {}",
                field,
                valid_choices()
            )));
        };

        let Some((dir, upstream)) = directions.iter().find(|(name, _)| name == dir) else {
            let allowed: Vec<&str> = directions.iter().map(|(d, _)| *d).collect();
            return Err(SearchError::InvalidSort(format!(
                "Invalid sort direction '{}' for field '{}'. Must be one of: {}",
                dir,
                field,
                allowed.join(", ")
            )));
        };

        if !is_upstream_sort(upstream) {
            tracing::warn!(
                "Sort '{}' mapped to '{}', which the upstream does not accept",
                sort,
                upstream
            );
            return Err(SearchError::InvalidSort(format!(
                "Invalid sort option '{}'. Must be one of: {}",
                sort,
                valid_choices()
            )));
        }

        Ok(AppliedSort {
            field: *field,
            dir: *dir,
            upstream: *upstream,
        })
    }
}

/// Membership in the upstream enum. `title desc` is the upstream's own
/// spelling of a descending title sort and is accepted as a `title` variant.
fn is_upstream_sort(value: &str) -> bool {
    let base = value.strip_suffix(" desc").unwrap_or(value);
    UPSTREAM_SORT_VALUES.contains(&base)
}

fn valid_choices() -> String {
    SORT_TABLE
        .iter()
        .flat_map(|(field, dirs)| dirs.iter().map(move |(dir, _)| format!("{field}_{dir}")))
        .collect::<Vec<_>>()
        .join(", ")
}
