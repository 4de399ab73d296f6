//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::state::AppState;
use crate::tools::cache::{CacheGateParams, CacheGetParams, gate_impl, get_impl};
use crate::tools::refresh::{RefreshPassParams, refresh_impl};
use crate::tools::track::{TrackDocumentParams, track_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for ical-cache.
#[derive(Clone)]
pub struct IcalCacheServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl IcalCacheServer {
    /// Create a new server handler over shared cache state.
    pub fn new(state: AppState) -> Self {
        Self { state, tool_router: Self::tool_router() }
    }

    /// Decide whether output embedding these calendars may be served from cache.
    ///
    /// Fails closed: one calendar without a cache entry makes the whole page uncacheable.
    #[tool(
        description = "Check whether a page embedding these calendar urls may be reused from cache. Returns cacheable plus the cache files to track as dependencies."
    )]
    async fn cache_gate(&self, params: Parameters<CacheGateParams>) -> Result<CallToolResult, McpError> {
        gate_impl(&self.state, params.0)
    }

    #[tool(
        description = "Record the calendar urls a document embeds. Existing urls keep their last-checked time; urls no longer listed are dropped."
    )]
    async fn track_document(&self, params: Parameters<TrackDocumentParams>) -> Result<CallToolResult, McpError> {
        track_impl(&self.state, params.0).await
    }

    /// Run one refresh pass.
    ///
    /// At most one calendar per document is fetched; it is rewritten only when its content
    /// changed apart from DTSTAMP lines.
    #[tool(
        description = "Run one refresh pass for a document (or every tracked document). Fetches the first stale calendar and updates its cache entry if the content changed."
    )]
    async fn refresh_pass(&self, params: Parameters<RefreshPassParams>) -> Result<CallToolResult, McpError> {
        refresh_impl(&self.state, params.0).await
    }

    #[tool(description = "Read the cached document for a calendar url. No network requests are made.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state, params.0).await
    }
}

impl ServerHandler for IcalCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "ical-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
