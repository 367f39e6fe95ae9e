use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
    #[error("Upload rejected: {0}")]
    Ingest(#[from] ingest::IngestError),
    #[error("Malformed multipart upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            // Upload validation failures carry their message to the client;
            // the user has to know which column or cell to fix.
            AppError::Ingest(ingest_err) => {
                tracing::warn!(error = %ingest_err, "Upload rejected.");
                (StatusCode::UNPROCESSABLE_ENTITY, ingest_err.to_string())
            }
            AppError::Multipart(multipart_err) => {
                (StatusCode::BAD_REQUEST, multipart_err.to_string())
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
