//! Test-only stores for exercising the server without SQLite.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StorageResult;
use crate::storage::{Question, Route, Storage};

/// Store where every question exists but each route lookup stalls for `delay`.
#[derive(Clone)]
pub(crate) struct SlowStorage {
    /// How long each route lookup sleeps.
    pub delay: Duration,
}

#[async_trait]
impl Storage for SlowStorage {
    async fn get_question(&self, id: &str) -> StorageResult<Option<Question>> {
        Ok(Some(Question::new(format!("Question {}", id), "").with_id(id)))
    }

    async fn get_route(&self, _from_id: &str, _condition: &str) -> StorageResult<Option<Route>> {
        tokio::time::sleep(self.delay).await;
        Ok(None)
    }

    async fn get_routes_from(&self, _from_id: &str) -> StorageResult<Vec<Route>> {
        Ok(Vec::new())
    }
}
