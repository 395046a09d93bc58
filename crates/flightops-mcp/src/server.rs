//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - execute tools via the server's [`ToolHandler`]
//! 3. Shutdown - input EOF ends the loop

use std::sync::Arc;

use serde_json::Value;

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// MCP server answering requests with one tool handler.
pub struct McpServer {
    handler: Arc<dyn ToolHandler>,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            handler,
            initialized: false,
        }
    }

    /// Whether an `initialize` request has been answered.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the server over stdin/stdout until EOF.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Run the server main loop over the given transport.
    ///
    /// Returns when the input is exhausted, or with the first I/O error.
    pub async fn serve(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        tracing::info!("Starting {} MCP server", self.handler.server_name());

        loop {
            let msg = match transport.read_message() {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("Transport error: {}", e);
                    return Err(e);
                }
            };

            if let Some(resp) = self.handle_message(msg).await {
                if let Err(e) = transport.write_response(&resp) {
                    tracing::error!("Failed to write response: {}", e);
                    return Err(e);
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
            IncomingMessage::Invalid(line) => Some(JsonRpcResponse::error(
                RequestId::Null,
                JsonRpcError::parse_error(&truncate(&line, 200)),
            )),
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => tracing::info!("Client initialized"),
            "notifications/cancelled" => tracing::debug!("Request cancelled by client"),
            _ => tracing::debug!("Ignoring notification: {}", method),
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            tracing::debug!("Repeated initialize, answering again");
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => {
                    let client = init.client_info.as_ref();
                    tracing::info!(
                        "Client: {} v{} (protocol: {})",
                        client.map_or("unknown", |c| c.name.as_str()),
                        client.map_or("", |c| c.version.as_str()),
                        init.protocol_version.as_deref().unwrap_or("unspecified")
                    );
                }
                Err(e) => tracing::warn!("Failed to parse initialize params: {}", e),
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: self.handler.server_name().to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        JsonRpcResponse::from_result(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        JsonRpcResponse::from_result(id, &result)
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, JsonRpcError::invalid_params(&e.to_string()));
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        tracing::info!("Calling tool: {}", params.name);

        let result = self.handler.execute(&params.name, params.arguments).await;
        if result.is_error == Some(true) {
            tracing::warn!("Tool {} returned an error result", params.name);
        }
        JsonRpcResponse::from_result(id, &result)
    }
}

fn truncate(line: &str, max: usize) -> String {
    match line.char_indices().nth(max) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None => line.to_string(),
    }
}
