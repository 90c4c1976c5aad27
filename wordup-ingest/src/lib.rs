//! wordup-ingest library
//!
//! Accepts uploaded word lists, spreadsheets and entry files, enriches the
//! words from a sharded remote dictionary, and merges the result into a
//! version-controlled collection with optimistic-concurrency writes.

pub mod api;
pub mod archive;
pub mod dictionary;
pub mod enricher;
pub mod error;
pub mod format;
pub mod merge;
pub mod pipeline;
pub mod store;
pub mod validator;

pub use crate::error::{ApiError, ApiResult, IngestError};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::archive::RawArchive;
use crate::pipeline::IngestPipeline;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub archive: Arc<RawArchive>,
    /// Largest accepted file
    pub max_upload_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: IngestPipeline, archive: RawArchive, max_upload_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            archive: Arc::new(archive),
            max_upload_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .merge(api::upload_routes())
        .merge(api::collection_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
