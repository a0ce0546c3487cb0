//! Request handlers for the search routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::models::SearchRequest;
use crate::sources::Source;

/// Cache policy attached to every successful search response
pub const CACHE_CONTROL_VALUE: &str = "max-age=3600";

/// `POST /api/arxiv`
pub async fn search_arxiv(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    search_with(state.arxiv.as_ref(), body).await
}

/// `POST /api/pubmed`
pub async fn search_pubmed(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    search_with(state.pubmed.as_ref(), body).await
}

/// Any other method on a search route
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

async fn search_with<S: Source>(
    source: &S,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    info!(
        source = source.id(),
        query = %request.query,
        max_results = request.max_results,
        "search request"
    );

    let response = source.search(&request).await?;

    Ok((
        [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
        Json(response),
    )
        .into_response())
}
