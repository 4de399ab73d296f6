//! refresh_pass tool implementation.
//!
//! Runs one refresh pass for a single document, or for every tracked
//! document when none is named. Each pass fetches at most one calendar.

use chrono::Utc;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use icalcache_core::{DocumentPass, RefreshOutcome};

use crate::error::ToolError;
use crate::state::AppState;
use crate::tools::track::TrackedResourceView;

/// Parameters for the refresh_pass tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RefreshPassParams {
    /// Document to refresh. All tracked documents when omitted.
    #[serde(default)]
    pub document: Option<String>,
}

/// One document's pass as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PassView {
    pub document: String,
    /// One of `no_op`, `updated`, `unchanged` or `failed`.
    pub outcome: String,
    /// The calendar checked by this pass, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The tracked list after the pass, when it changed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<TrackedResourceView>,
}

impl PassView {
    fn from_outcome(document: String, outcome: &RefreshOutcome) -> Self {
        let label = match outcome {
            RefreshOutcome::NoOp => "no_op",
            RefreshOutcome::Updated { .. } => "updated",
            RefreshOutcome::Unchanged { .. } => "unchanged",
        };
        Self {
            document,
            outcome: label.into(),
            url: outcome.url().map(str::to_string),
            error: None,
            resources: outcome
                .resources()
                .unwrap_or_default()
                .iter()
                .map(TrackedResourceView::from)
                .collect(),
        }
    }

    fn from_pass(pass: DocumentPass) -> Self {
        match pass.outcome {
            Ok(outcome) => Self::from_outcome(pass.document, &outcome),
            Err(e) => Self {
                document: pass.document,
                outcome: "failed".into(),
                url: None,
                error: Some(e.to_string()),
                resources: Vec::new(),
            },
        }
    }
}

/// Output from the refresh_pass tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshPassOutput {
    pub passes: Vec<PassView>,
}

/// Implementation of the refresh_pass tool.
///
/// With a named document, a failed fetch is returned as the tool error.
/// Across all documents, failures are reported per document.
pub async fn refresh_impl(state: &AppState, params: RefreshPassParams) -> Result<CallToolResult, McpError> {
    let now = Utc::now();

    let passes = match params.document {
        Some(document) => {
            if document.trim().is_empty() {
                return Err(ToolError::InvalidInput("document must not be empty".into()).into());
            }
            let outcome = state.worker.run_document(&document, now).await?;
            vec![PassView::from_outcome(document, &outcome)]
        }
        None => state.worker.run_all(now).await?.into_iter().map(PassView::from_pass).collect(),
    };

    let output = RefreshPassOutput { passes };
    let json = serde_json::to_string_pretty(&output).map_err(ToolError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
