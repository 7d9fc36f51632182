use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode, header::REFERER},
    response::IntoResponse,
};

use crate::domain::SearchError;
use crate::infrastructure::AppState;
use crate::models::{SearchReply, SearchRequest};

#[utoipa::path(
    get,
    path = "/search",
    params(
        ("q" = String, Query, description = "Search terms; quoted phrases are kept as typed"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("perpage" = Option<u32>, Query, description = "Results per page"),
        ("sort" = Option<String>, Query, description = "field_direction, e.g. title_asc"),
        ("Referer" = Option<String>, Header, description = "Page hosting the widget; selects the library")
    ),
    responses(
        (status = 200, description = "Search results", body = crate::models::SearchResponse),
        (status = 400, description = "Invalid parameters", body = crate::models::ErrorResponse),
        (status = 401, description = "No OCLC token available", body = crate::models::ErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::models::ErrorResponse),
        (status = 503, description = "WorldCat unavailable", body = crate::models::ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> impl IntoResponse {
    let reply = match query {
        Ok(Query(pairs)) => {
            let mut params = SearchRequest::from_query_pairs(pairs);
            params.referrer = headers
                .get(REFERER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            state.search.search(params).await
        }
        Err(rejection) => {
            tracing::debug!("Rejected query string: {}", rejection.body_text());
            SearchReply::from_error(&SearchError::InvalidParameters(rejection.body_text()))
        }
    };

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply))
}
