//! Error types for wordup-ingest
//!
//! [`IngestError`] classifies pipeline failures. [`ApiError`] is what HTTP
//! handlers return; it renders a JSON body with a machine code and a
//! human-readable message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of an ingest request
///
/// Dictionary lookups never appear here: a failed shard fetch degrades
/// to sentinel translations instead of failing the request.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File extension or format tag not recognised
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Bytes do not parse under the declared format
    #[error("Malformed input: {0}")]
    Format(String),

    /// Converted entries do not have the canonical shape
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// Persisted collection could not be read (other than not-found)
    #[error("Failed to read persisted collection: {0}")]
    StoreRead(String),

    /// Version token was stale at write time
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Write rejected for a reason other than a version conflict
    #[error("Failed to write persisted collection: {0}")]
    StoreWrite(String),

    /// wordup-common error
    #[error("Common error: {0}")]
    Common(#[from] wordup_common::Error),
}

impl IngestError {
    /// Machine-readable classification used in API responses
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            IngestError::Format(_) => "FORMAT_ERROR",
            IngestError::SchemaValidation(_) => "SCHEMA_VALIDATION",
            IngestError::StoreRead(_) => "STORE_READ_ERROR",
            IngestError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            IngestError::StoreWrite(_) => "STORE_WRITE_ERROR",
            IngestError::Common(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            IngestError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestError::Format(_) => StatusCode::BAD_REQUEST,
            IngestError::SchemaValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::StoreRead(_) | IngestError::StoreWrite(_) => StatusCode::BAD_GATEWAY,
            IngestError::ConcurrentModification(_) => StatusCode::CONFLICT,
            IngestError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Pipeline failure
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
            ApiError::Ingest(ref err) => (err.status(), err.code(), err.to_string()),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_status_mapping() {
        let cases = [
            (IngestError::UnsupportedFormat("x".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (IngestError::Format("x".into()), StatusCode::BAD_REQUEST),
            (IngestError::SchemaValidation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (IngestError::StoreRead("x".into()), StatusCode::BAD_GATEWAY),
            (IngestError::ConcurrentModification("x".into()), StatusCode::CONFLICT),
            (
                IngestError::Common(wordup_common::Error::Config("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
