//! MCP tool implementations.
//!
//! This module contains all tools exposed by the ical-cache server.

pub mod cache;
pub mod refresh;
pub mod track;

pub use cache::{CacheGateParams, CacheGetParams};
pub use refresh::RefreshPassParams;
pub use track::TrackDocumentParams;

/// Text of the first content block of a tool result.
#[cfg(test)]
pub(crate) fn output_text(result: &rmcp::model::CallToolResult) -> String {
    let value = serde_json::to_value(&result.content[0]).unwrap();
    value["text"].as_str().unwrap().to_string()
}
