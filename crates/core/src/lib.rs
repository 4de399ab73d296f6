//! Core types and shared functionality for ical-cache.
//!
//! This crate provides:
//! - File-backed cache of remote calendar documents plus SQLite metadata
//! - The cache gate deciding whether rendered output may be reused
//! - The refresh worker converging the cache toward remote content
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod refresh;

pub use cache::{CacheDb, CacheStore, FileStore, TrackedResource};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use fetch::Fetch;
pub use gate::{CacheGate, GateDecision};
pub use refresh::{DocumentPass, RefreshOutcome, RefreshWorker, run_one_pass};
