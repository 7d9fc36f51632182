pub mod search;
pub mod upstream;

pub use search::{
    AppliedSort, ErrorResponse, FormattedResult, SearchPayload, SearchReply, SearchRequest,
    SearchResponse, SortEcho, SortOption, ValidatedRequest,
};
pub use upstream::{BriefBibsQuery, UpstreamRecord, UpstreamSearch};
