//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers for flow resolution and question lookup
//! - Shared application state management

mod handlers;
mod mcp;
#[cfg(test)]
mod test_support;

pub use handlers::*;
pub use mcp::*;

use std::sync::Arc;

use crate::config::Config;
use crate::flow::FlowResolver;
use crate::storage::{SqliteStorage, Storage};

/// Application state shared across handlers.
///
/// Generic over the store so handlers can run against any [`Storage`];
/// the server binary uses [`SqliteStorage`].
#[derive(Clone)]
pub struct AppState<S = SqliteStorage> {
    /// Application configuration.
    pub config: Config,
    /// Storage backend.
    pub storage: S,
    /// Flow resolver reading from `storage`.
    pub resolver: FlowResolver<S>,
}

impl<S: Storage + Clone> AppState<S> {
    /// Create new application state
    pub fn new(config: Config, storage: S) -> Self {
        tracing::info!(
            database = %config.database.path.display(),
            resolve_timeout_ms = config.flow.resolve_timeout_ms,
            "AppState initializing"
        );

        let resolver = FlowResolver::new(storage.clone());

        Self {
            config,
            storage,
            resolver,
        }
    }
}

/// Shared application state handle
pub type SharedState<S = SqliteStorage> = Arc<AppState<S>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, FlowConfig, LogFormat, LoggingConfig};
    use crate::storage::Question;
    use std::path::PathBuf;

    fn create_test_config() -> Config {
        Config {
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
                max_connections: 1,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
            flow: FlowConfig {
                resolve_timeout_ms: 500,
            },
        }
    }

    #[tokio::test]
    async fn test_app_state_config_access() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let state = AppState::new(create_test_config(), storage);

        assert_eq!(state.config.flow.resolve_timeout_ms, 500);
        assert_eq!(state.config.logging.level, "debug");
    }

    #[tokio::test]
    async fn test_resolver_shares_storage() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let state = AppState::new(create_test_config(), storage);

        let q = Question::new("Hello", "").with_id("q-hello");
        state.storage.create_question(&q).await.unwrap();

        let via_resolver = state.resolver.storage().get_question("q-hello").await.unwrap();
        assert!(via_resolver.is_some());
    }

    #[tokio::test]
    async fn test_shared_state_type() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let shared: SharedState = Arc::new(AppState::new(create_test_config(), storage));

        let shared2 = Arc::clone(&shared);
        assert_eq!(Arc::strong_count(&shared), 2);
        drop(shared2);
        assert_eq!(Arc::strong_count(&shared), 1);
    }
}
