//! # LINE Question Flow
//!
//! Resolves question flows for a LINE chatbot. A flow starts at one question
//! and follows the route whose condition matches a fixed label at every step,
//! stopping at a missing question, a missing route, a route without a target,
//! or the first revisited question.
//!
//! ## Architecture
//!
//! ```text
//! MCP Client / CLI → FlowResolver → Storage (trait)
//!                                       ↓
//!                                 SQLite (questions, routes)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use line_question_flow::{Config, FlowResolver};
//! use line_question_flow::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let resolver = FlowResolver::new(storage);
//!     for question in resolver.resolve("welcome", "new_customer").await? {
//!         println!("{}: {}", question.id, question.title);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line subcommands.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Question flow resolution.
pub mod flow;
/// MCP server implementation and request handling.
pub mod server;
/// Question and route storage.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult, StorageError, StorageResult};
pub use flow::{FlowEnd, FlowResolver, FlowTrace};
pub use server::{AppState, McpServer, SharedState};
