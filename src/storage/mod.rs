//! Storage layer for question flow data.
//!
//! This module defines the question and route records the resolver reads,
//! the [`Storage`] trait it reads them through, and a SQLite-backed
//! implementation used by the CLI and the tool server.

mod sqlite;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;

/// A node in the bot's conversational flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique question identifier.
    pub id: String,
    /// Short title shown in the dashboard.
    pub title: String,
    /// Message body sent to the user.
    #[serde(default)]
    pub body: String,
    /// Question type tag (e.g., "text", "choice", "image").
    #[serde(default = "default_kind")]
    pub kind: String,
    /// When the question was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_kind() -> String {
    "text".to_string()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl Question {
    /// Create a new question with a generated id.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            body: body.into(),
            kind: default_kind(),
            created_at: Utc::now(),
        }
    }

    /// Replace the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the question type tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// A condition-labelled edge from one question to the next.
///
/// The store keeps at most one route per `(question_id, condition)`.
/// A route without a target ends the flow for its condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Unique route identifier.
    #[serde(default = "new_id")]
    pub id: String,
    /// Source question ID.
    pub question_id: String,
    /// Branch condition label (e.g., a previous answer category).
    pub condition: String,
    /// Target question ID.
    #[serde(default)]
    pub next_question_id: Option<String>,
}

impl Route {
    /// Create a route from `question_id` to `next_question_id` under `condition`.
    pub fn new(
        question_id: impl Into<String>,
        condition: impl Into<String>,
        next_question_id: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            question_id: question_id.into(),
            condition: condition.into(),
            next_question_id: Some(next_question_id.into()),
        }
    }

    /// Create a route that explicitly ends the flow under `condition`.
    pub fn terminal(question_id: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            question_id: question_id.into(),
            condition: condition.into(),
            next_question_id: None,
        }
    }
}

/// A batch of questions and routes loaded together by the importer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowDocument {
    /// Questions to insert.
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Routes to insert; their endpoints may reference questions in this batch.
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// Counts of records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Number of questions inserted.
    pub questions: usize,
    /// Number of routes inserted.
    pub routes: usize,
}

/// Read access to question flow data.
///
/// `Ok(None)` means the record does not exist; `Err` means the store failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get a question by ID.
    async fn get_question(&self, id: &str) -> StorageResult<Option<Question>>;
    /// Get the route leaving `from_id` under `condition`.
    async fn get_route(&self, from_id: &str, condition: &str) -> StorageResult<Option<Route>>;
    /// Get all routes leaving a question, ordered by condition.
    async fn get_routes_from(&self, from_id: &str) -> StorageResult<Vec<Route>>;
}
