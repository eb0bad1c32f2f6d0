//! # GreenChain Common Library
//!
//! Shared code for the GreenChain LMS service:
//! - Error type
//! - Configuration loading
//! - Database initialization
//! - Key-value storage trait and backends
//! - Credential and bearer-token helpers
//! - Data model (lessons, questions, essay responses, recommendations, users)

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod kv;
pub mod models;

pub use error::{Error, Result};
pub use kv::KeyValueStore;
