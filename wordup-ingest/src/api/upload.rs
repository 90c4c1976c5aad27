//! Upload endpoints
//!
//! POST /api/upload runs the full convert-enrich-merge-persist pipeline.
//! POST /api/upload/raw only archives the file verbatim.
//! Both expect a multipart body with a single `file` field carrying a
//! file name.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use crate::archive::ArchiveOutcome;
use crate::error::{ApiError, ApiResult};
use crate::pipeline::{IngestReport, Upload};
use crate::AppState;

/// Multipart field carrying the uploaded file
pub const FILE_FIELD: &str = "file";

/// POST /api/upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: IngestReport,
}

/// POST /api/upload/raw response
#[derive(Debug, Serialize)]
pub struct RawUploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub archive: ArchiveOutcome,
}

/// POST /api/upload
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let upload = read_file_field(multipart, state.max_upload_bytes).await?;

    tracing::info!(file = %upload.filename, bytes = upload.size(), "Received upload");

    let report = state.pipeline.ingest(upload).await?;

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Merged {} entries; collection now holds {}",
            report.received, report.total
        ),
        report,
    }))
}

/// POST /api/upload/raw
pub async fn upload_raw(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<RawUploadResponse>> {
    let upload = read_file_field(multipart, state.max_upload_bytes).await?;

    let archive = state.archive.archive(&upload.filename, &upload.bytes).await?;

    Ok(Json(RawUploadResponse {
        success: true,
        message: format!("File stored as {}", archive.path),
        archive,
    }))
}

/// Pull the `file` field out of a multipart body
async fn read_file_field(mut multipart: Multipart, max_bytes: usize) -> ApiResult<Upload> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("uploaded file has no file name".to_string()))?;

        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "{} is {} bytes, limit is {}",
                filename,
                bytes.len(),
                max_bytes
            )));
        }

        return Ok(Upload::new(filename, bytes.to_vec()));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload_file))
        .route("/api/upload/raw", post(upload_raw))
}
