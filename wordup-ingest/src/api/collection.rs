//! Read access to the persisted collection

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use wordup_common::Entry;

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/collection response
#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    /// Version token of the collection, absent if it was never written
    pub version: Option<String>,
    pub total: usize,
    pub entries: Vec<Entry>,
}

/// GET /api/collection
pub async fn get_collection(State(state): State<AppState>) -> ApiResult<Json<CollectionResponse>> {
    let current = state.pipeline.merge_store().read_current().await?;

    Ok(Json(CollectionResponse {
        version: current.version.map(|v| v.to_string()),
        total: current.entries.len(),
        entries: current.entries,
    }))
}

/// Build collection routes
pub fn collection_routes() -> Router<AppState> {
    Router::new().route("/api/collection", get(get_collection))
}
