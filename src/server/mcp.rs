//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! Requests arrive one per line; each response is written as a single line.
//! Notifications (requests without an id) never get a response.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState};
use crate::error::McpError;
use crate::storage::{SqliteStorage, Storage};

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC error codes.
pub mod codes {
    /// The line is not valid JSON or not a request object.
    pub const PARSE_ERROR: i32 = -32700;
    /// The request object is malformed, e.g. a wrong `jsonrpc` version.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// The method parameters are missing or malformed.
    pub const INVALID_PARAMS: i32 = -32602;
    /// The server failed while building a response.
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0".
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0".
    pub jsonrpc: String,
    /// Echoed request id, `null` when the request could not be parsed.
    pub id: Value,
    /// Result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors), see [`codes`].
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Tool name used in tools/call.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the tool arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Tool arguments.
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// MCP server exposing the flow tools.
pub struct McpServer<S = SqliteStorage> {
    state: SharedState<S>,
}

impl<S: Storage> McpServer<S> {
    /// Create a new MCP server
    pub fn new(state: SharedState<S>) -> Self {
        Self { state }
    }

    /// Run the server on stdin/stdout until EOF.
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Question flow tool server listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited requests from `reader`, answering on `writer`.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        codes::PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request; `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        if request.jsonrpc != "2.0" {
            let err = McpError::InvalidRequest {
                message: format!("unsupported jsonrpc version {}", request.jsonrpc),
            };
            error!(error = %err, "Rejected request");
            return (!is_notification).then(|| {
                JsonRpcResponse::error(request.id, codes::INVALID_REQUEST, err.to_string())
            });
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" | "notifications/cancelled" => {
                debug!(method = %request.method, "Received notification");
                None
            }
            "tools/list" => Some(JsonRpcResponse::success(
                request.id,
                json!({ "tools": tool_definitions() }),
            )),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            method if is_notification => {
                debug!(method = %method, "Unknown notification, ignoring");
                None
            }
            method => {
                error!(method = %method, "Unknown method");
                Some(JsonRpcResponse::error(
                    request.id,
                    codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", method),
                ))
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    codes::INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                );
            }
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        info!(tool = %params.name, "Handling tool call");

        // Tool failures are reported in the result body, not as protocol errors.
        let (text, is_error) =
            match handle_tool_call(&*self.state, &params.name, params.arguments).await {
                Ok(result) => match serde_json::to_string_pretty(&result) {
                    Ok(text) => (text, false),
                    Err(e) => {
                        error!(error = %e, "Failed to serialize tool result");
                        return JsonRpcResponse::error(
                            id,
                            codes::INTERNAL_ERROR,
                            format!("Internal error: {}", e),
                        );
                    }
                },
                Err(e) => (format!("Error: {}", e), true),
            };

        let mut result = json!({ "content": [{ "type": "text", "text": text }] });
        if is_error {
            result["isError"] = Value::Bool(true);
        }

        JsonRpcResponse::success(id, result)
    }
}

/// Definitions of every tool this server exposes.
pub fn tool_definitions() -> Vec<Tool> {
    vec![resolve_tool(), question_get_tool()]
}

fn resolve_tool() -> Tool {
    Tool {
        name: "flow_resolve".to_string(),
        description: "Follow a question flow from a start question, taking the route that matches the condition at each step. Stops at a missing question, a missing route, or a revisited question. An unknown start_id yields an empty list.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "start_id": {
                    "type": "string",
                    "description": "ID of the first question"
                },
                "condition": {
                    "type": "string",
                    "description": "Branch condition label to follow (e.g., a previous answer category)"
                },
                "include_end": {
                    "type": "boolean",
                    "description": "Also return why the flow ended (default: false)"
                }
            },
            "required": ["start_id", "condition"],
            "additionalProperties": false
        }),
    }
}

fn question_get_tool() -> Tool {
    Tool {
        name: "flow_question_get".to_string(),
        description: "Get a question and all of its outgoing routes.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "question_id": {
                    "type": "string",
                    "description": "The question ID"
                }
            },
            "required": ["question_id"],
            "additionalProperties": false
        }),
    }
}
