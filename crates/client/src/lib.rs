//! HTTP client for ical-cache.
//!
//! This crate provides the fetch pipeline the refresh worker uses to pull
//! remote calendars, implementing [`icalcache_core::Fetch`].

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse};
