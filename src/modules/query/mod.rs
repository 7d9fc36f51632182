//! Request validation stages. All of them are pure, in-memory transforms.

pub mod library;
pub mod pagination;
pub mod sanitizer;
pub mod sort;

pub use library::LibraryResolver;
pub use pagination::{MAX_OFFSET, Pagination, Paginator};
pub use sanitizer::{MAX_QUERY_LENGTH, QuerySanitizer};
pub use sort::{DEFAULT_SORT, SortMapper};
