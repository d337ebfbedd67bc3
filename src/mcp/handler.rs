//! MCP server handler, shared application state, and tool router.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::{
    tool::{ToolCallContext, ToolRoute, ToolRouter},
    ServerHandler,
};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use tracing::info_span;

use crate::config::GlobalConfig;
use crate::mcp::tools::{self, ToolError};

/// Shared application state accessible by all MCP tool handlers.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
}

/// MCP server handler answering tool list and call requests for one session.
///
/// One instance exists per open session; all instances share [`AppState`].
pub struct ClockServer {
    state: Arc<AppState>,
}

impl ClockServer {
    /// Create a new MCP server bound to shared application state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Access the shared application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    fn tool_router() -> ToolRouter<Self> {
        let mut router = ToolRouter::new();

        for tool in tools::catalog() {
            let name = tool.name.to_string();
            match name.as_str() {
                tools::current_time::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::current_time::handle(context))
                    }));
                }
                tools::timezone_info::NAME => {
                    router.add_route(ToolRoute::new_dyn(tool, |context| {
                        Box::pin(tools::timezone_info::handle(context))
                    }));
                }
                _ => {
                    router.add_route(ToolRoute::new_dyn(tool, |_context| {
                        Box::pin(async {
                            Err(rmcp::ErrorData::internal_error(
                                "tool not implemented",
                                None,
                            ))
                        })
                    }));
                }
            }
        }

        router
    }
}

impl ServerHandler for ClockServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "clocktower".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Implementation::default()
            },
            instructions: Some(
                "Time query server. Call get_current_time for the current time \
                 in several formats, or get_timezone_info for the server's \
                 timezone, UTC offset, and clock readings."
                    .into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_ {
        let router = Self::tool_router();
        let _span = info_span!("call_tool", tool = %request.name).entered();

        async move {
            // Unknown names are rejected here so the router only ever sees
            // registered tools; the typed failure becomes a protocol-level
            // error frame, never a transport fault.
            if !tools::is_known(&request.name) {
                return Err(ToolError::UnknownTool(request.name.to_string()).into());
            }

            router
                .call(ToolCallContext::new(self, request, context))
                .await
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_ {
        let tools = tools::catalog();

        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }
}
