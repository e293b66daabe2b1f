//! Question flow resolution.
//!
//! A flow is the path produced by starting at one question and repeatedly
//! following the route whose condition matches a fixed label. Resolution
//! stops at a missing question, a missing route, a route without a target,
//! or the first revisited question.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::storage::{Question, Storage};


/// Why a resolution stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FlowEnd {
    /// The current id has no question record.
    MissingQuestion { id: String },
    /// The last question has no route for the condition.
    NoRoute { question_id: String },
    /// The last question's route for the condition has no target.
    TerminalRoute { question_id: String },
    /// The next id was already visited.
    Cycle { id: String },
}

impl std::fmt::Display for FlowEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowEnd::MissingQuestion { id } => write!(f, "missing question {}", id),
            FlowEnd::NoRoute { question_id } => write!(f, "no route from {}", question_id),
            FlowEnd::TerminalRoute { question_id } => {
                write!(f, "terminal route from {}", question_id)
            }
            FlowEnd::Cycle { id } => write!(f, "cycle back to {}", id),
        }
    }
}

/// Visited questions plus the reason resolution stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTrace {
    /// Questions in visitation order.
    pub questions: Vec<Question>,
    /// Why the walk ended.
    pub end: FlowEnd,
}

/// Walks question routes under a fixed condition.
///
/// The resolver owns its store handle and keeps no state between calls.
#[derive(Clone)]
pub struct FlowResolver<S> {
    storage: S,
}

impl<S: Storage> FlowResolver<S> {
    /// Create a resolver reading from `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The store this resolver reads from.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Resolve the flow from `start_id` under `condition`.
    ///
    /// Returns an empty list when the start question does not exist.
    /// Store failures are returned as errors, never as a shortened path.
    pub async fn resolve(&self, start_id: &str, condition: &str) -> StorageResult<Vec<Question>> {
        Ok(self.trace(start_id, condition).await?.questions)
    }

    /// Resolve the flow and report why it ended.
    pub async fn trace(&self, start_id: &str, condition: &str) -> StorageResult<FlowTrace> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut questions = Vec::new();
        let mut current = start_id.to_string();

        let end = loop {
            if !visited.insert(current.clone()) {
                break FlowEnd::Cycle { id: current };
            }

            let fetched = self.storage.get_question(&current).await?;
            let Some(question) = fetched else {
                break FlowEnd::MissingQuestion { id: current };
            };

            debug!(
                step = questions.len(),
                question_id = %question.id,
                condition,
                "Visited question"
            );
            questions.push(question);

            let route = self.storage.get_route(&current, condition).await?;
            match route {
                None => break FlowEnd::NoRoute {
                    question_id: current,
                },
                Some(route) => match route.next_question_id {
                    None => break FlowEnd::TerminalRoute {
                        question_id: current,
                    },
                    Some(next) => current = next,
                },
            }
        };

        info!(
            start_id,
            condition,
            steps = questions.len(),
            end = %end,
            "Flow resolved"
        );

        Ok(FlowTrace { questions, end })
    }
}
