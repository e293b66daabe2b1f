//! CLI commands for inspecting and loading question flows.

use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::flow::{FlowResolver, FlowTrace};
use crate::storage::{FlowDocument, Question, Route, SqliteStorage, Storage};

/// Flow subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum FlowCommands {
    /// Run the MCP tool server on stdio (default)
    Serve,

    /// Resolve the flow starting at a question
    Resolve {
        /// ID of the first question
        #[arg(long)]
        start: String,

        /// Branch condition followed at every step
        #[arg(long)]
        condition: String,

        /// Print JSON instead of a readable path
        #[arg(long)]
        json: bool,
    },

    /// Show a question and its outgoing routes
    Show {
        /// Question ID
        question_id: String,
    },

    /// Import questions and routes from a JSON flow document
    Import {
        /// Path to the document
        file: PathBuf,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Execute a flow CLI command. `Serve` is handled by the binary.
pub async fn execute_command(command: FlowCommands, storage: &SqliteStorage) -> CliResult {
    match command {
        FlowCommands::Serve => CliResult::error("serve runs the tool server and has no CLI output"),
        FlowCommands::Resolve {
            start,
            condition,
            json,
        } => execute_resolve(storage, &start, &condition, json).await,
        FlowCommands::Show { question_id } => execute_show(storage, &question_id).await,
        FlowCommands::Import { file } => execute_import(storage, &file).await,
    }
}

async fn execute_resolve(
    storage: &SqliteStorage,
    start: &str,
    condition: &str,
    json: bool,
) -> CliResult {
    let resolver = FlowResolver::new(storage.clone());

    let trace = match resolver.trace(start, condition).await {
        Ok(trace) => trace,
        Err(e) => return CliResult::error(format!("Failed to resolve flow: {}", e)),
    };

    if json {
        return match serde_json::to_string_pretty(&trace) {
            Ok(text) => CliResult::success(text),
            Err(e) => CliResult::error(format!("Failed to serialize flow: {}", e)),
        };
    }

    CliResult::success(format_trace(start, condition, &trace))
}

async fn execute_show(storage: &SqliteStorage, question_id: &str) -> CliResult {
    let question = match storage.get_question(question_id).await {
        Ok(Some(q)) => q,
        Ok(None) => return CliResult::error(format!("Question not found: {}", question_id)),
        Err(e) => return CliResult::error(format!("Failed to load question: {}", e)),
    };

    match storage.get_routes_from(question_id).await {
        Ok(routes) => CliResult::success(format_question(&question, &routes)),
        Err(e) => CliResult::error(format!("Failed to load routes: {}", e)),
    }
}

async fn execute_import(storage: &SqliteStorage, file: &Path) -> CliResult {
    let raw = match tokio::fs::read_to_string(file).await {
        Ok(raw) => raw,
        Err(e) => return CliResult::error(format!("Failed to read {}: {}", file.display(), e)),
    };

    let document: FlowDocument = match serde_json::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => return CliResult::error(format!("Invalid flow document: {}", e)),
    };

    match storage.import_flow(&document).await {
        Ok(summary) => CliResult::success(format!(
            "Imported {} questions and {} routes from {}",
            summary.questions,
            summary.routes,
            file.display()
        )),
        Err(e) => CliResult::error(e.to_string()),
    }
}

fn format_trace(start: &str, condition: &str, trace: &FlowTrace) -> String {
    let mut output = format!("Flow from {} under '{}'\n", start, condition);

    for (step, question) in trace.questions.iter().enumerate() {
        output.push_str(&format!(
            "  {:>2}. [{}] {} ({})\n",
            step + 1,
            question.kind,
            question.title,
            question.id
        ));
    }

    output.push_str(&format!("Ended: {}\n", trace.end));
    output
}

fn format_question(question: &Question, routes: &[Route]) -> String {
    let mut output = format!("{} [{}] {}\n", question.id, question.kind, question.title);
    if !question.body.is_empty() {
        output.push_str(&format!("  {}\n", question.body));
    }

    if routes.is_empty() {
        output.push_str("  (no routes)\n");
    }
    for route in routes {
        output.push_str(&format!(
            "  {} -> {}\n",
            route.condition,
            route.next_question_id.as_deref().unwrap_or("(end)")
        ));
    }

    output
}
