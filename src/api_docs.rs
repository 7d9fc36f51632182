use crate::api;
use crate::models::{ErrorResponse, FormattedResult, SearchResponse, SortEcho, SortOption};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(api::health::health_check, api::search::search),
    components(schemas(SearchResponse, ErrorResponse, FormattedResult, SortEcho, SortOption)),
    tags(
        (name = "worldcat-bridge", description = "WorldCat Discovery search for the Springshare widget")
    )
)]
pub struct ApiDoc;
