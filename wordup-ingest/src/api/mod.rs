//! HTTP API handlers for wordup-ingest

pub mod collection;
pub mod health;
pub mod upload;

pub use collection::collection_routes;
pub use health::health_routes;
pub use upload::upload_routes;
