use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::AppState;
use crate::error::{McpError, McpResult, StorageError};
use crate::flow::FlowEnd;
use crate::storage::{Question, Route, Storage};

/// Parameters for `flow_resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveParams {
    /// First question of the flow.
    pub start_id: String,
    /// Branch condition followed at every step.
    pub condition: String,
    /// Include the reason the flow ended.
    #[serde(default)]
    pub include_end: bool,
}

/// Result of `flow_resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResult {
    /// Echo of the requested start question.
    pub start_id: String,
    /// Echo of the requested condition.
    pub condition: String,
    /// Questions in visitation order.
    pub questions: Vec<Question>,
    /// Why the flow ended, when `include_end` was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<FlowEnd>,
}

/// Parameters for `flow_question_get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionParams {
    /// Question to look up.
    pub question_id: String,
}

/// Result of `flow_question_get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    /// The question record.
    pub question: Question,
    /// Outgoing routes, ordered by condition.
    pub routes: Vec<Route>,
}

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call<S: Storage>(
    state: &AppState<S>,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "flow_resolve" => handle_resolve(state, arguments).await,
        "flow_question_get" => handle_question_get(state, arguments).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Handle flow_resolve tool call
///
/// Any start id is accepted; one with no question yields an empty flow.
async fn handle_resolve<S: Storage>(
    state: &AppState<S>,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: ResolveParams = parse_arguments("flow_resolve", arguments)?;

    let start = Instant::now();
    let timeout_ms = state.config.flow.resolve_timeout_ms;
    let trace = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        state.resolver.trace(&params.start_id, &params.condition),
    )
    .await
    .map_err(|_| {
        warn!(start_id = %params.start_id, timeout_ms, "Flow resolution timed out");
        McpError::Timeout {
            tool_name: "flow_resolve".to_string(),
            timeout_ms,
        }
    })??;

    info!(
        start_id = %params.start_id,
        steps = trace.questions.len(),
        latency_ms = start.elapsed().as_millis() as u64,
        "flow_resolve completed"
    );

    let result = ResolveResult {
        start_id: params.start_id,
        condition: params.condition,
        questions: trace.questions,
        end: params.include_end.then_some(trace.end),
    };

    serde_json::to_value(result).map_err(McpError::Json)
}

/// Handle flow_question_get tool call
async fn handle_question_get<S: Storage>(
    state: &AppState<S>,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: QuestionParams = parse_arguments("flow_question_get", arguments)?;

    let question = state
        .storage
        .get_question(&params.question_id)
        .await?
        .ok_or_else(|| StorageError::QuestionNotFound {
            question_id: params.question_id.clone(),
        })?;
    let routes = state.storage.get_routes_from(&params.question_id).await?;

    serde_json::to_value(QuestionResult { question, routes }).map_err(McpError::Json)
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}
