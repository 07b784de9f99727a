use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jobbot_core::error::AppError;

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `AppError`.
///
/// Every extraction failure is fatal for the request and answers 500 with
/// the error's message.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, kind = self.0.kind(), "Scrape failed");
        let body = ErrorResponse::new(self.0.to_string());
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
    }
}
