//! Cache key and content fingerprint generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a calendar url.
///
/// The url is hashed exactly as tracked, so two spellings of the same feed
/// get separate entries.
pub fn compute_cache_key(url: &str) -> String {
    hex::encode(Sha256::digest(url.as_bytes()))
}

/// Fingerprint a (normalized) document body for change detection.
pub fn fingerprint(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
