//! # Wordup Common Library
//!
//! Shared code for the wordup services including:
//! - Canonical dictionary entry model
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Entry, SourceRecord, SENTINEL_NOT_FOUND};
