//! Local cache of remote calendar documents.
//!
//! This module provides:
//!
//! - URL-addressed cache keys and SHA-256 content fingerprints
//! - Change-detection normalization (volatile `DTSTAMP:` lines)
//! - A file-backed byte store whose paths double as render dependencies
//! - SQLite metadata for the calendars each document tracks, with migrations

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod normalize;
pub mod resources;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::{compute_cache_key, fingerprint};
pub use normalize::{normalize, normalized_fingerprint};
pub use resources::TrackedResource;
pub use store::{CacheStore, FileStore, read_cached};
