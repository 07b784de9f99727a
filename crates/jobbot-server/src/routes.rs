use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::dto::{ErrorResponse, HealthResponse, PostingDto, ScrapeRequest, ScrapeResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/scrape", post(scrape))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/scrape",
    request_body = ScrapeRequest,
    responses(
        (status = 200, description = "Extracted postings", body = ScrapeResponse),
        (status = 400, description = "Missing url or malformed body", body = ErrorResponse),
        (status = 500, description = "Extraction failed", body = ErrorResponse),
    ),
    tag = "scrape"
)]
pub async fn scrape(
    State(state): State<Arc<AppState>>,
    body: Result<axum::Json<ScrapeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let axum::Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return Ok(bad_request(rejection)),
    };

    let Some(url) = body.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            axum::Json(ErrorResponse::new("url required")),
        )
            .into_response());
    };

    // Dropping this future on client disconnect cancels the extraction.
    let postings = state.extractor.extract(url, body.kind.as_deref()).await?;

    let response = ScrapeResponse {
        ok: true,
        jobs: postings.into_iter().map(PostingDto::from).collect(),
    };
    Ok(axum::Json(response).into_response())
}

fn bad_request(rejection: JsonRejection) -> Response {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    tracing::debug!(%status, error = %rejection.body_text(), "Rejected scrape request body");
    (status, axum::Json(ErrorResponse::new(rejection.body_text()))).into_response()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health() -> impl IntoResponse {
    axum::Json(HealthResponse { status: "ok" })
}
