//! Read-only cache tools.
//!
//! This module provides the tools a host consults before reusing rendered
//! output, plus direct access to cached documents.

pub mod gate;
pub mod get;

pub use gate::{CacheGateParams, gate_impl};
pub use get::{CacheGetParams, get_impl};
