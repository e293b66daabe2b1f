use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Storage layer errors
///
/// A missing question or route is not an error: reads return `Ok(None)`.
/// These variants describe faults in the store itself.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Question not found: {question_id}")]
    QuestionNotFound { question_id: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Flow import failed: {message}")]
    Import { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Tool {tool_name} timed out after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for McpError {
    fn from(err: StorageError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::QuestionNotFound {
            question_id: "q-123".to_string(),
        };
        assert_eq!(err.to_string(), "Question not found: q-123");

        let err = StorageError::Import {
            message: "duplicate route".to_string(),
        };
        assert_eq!(err.to_string(), "Flow import failed: duplicate route");

        let err = StorageError::Migration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: version mismatch");
    }

    #[test]
    fn test_mcp_error_display() {
        let err = McpError::InvalidRequest {
            message: "unsupported jsonrpc version 1.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid request: unsupported jsonrpc version 1.0"
        );

        let err = McpError::UnknownTool {
            tool_name: "nonexistent".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown tool: nonexistent");

        let err = McpError::InvalidParameters {
            tool_name: "flow_resolve".to_string(),
            message: "missing start_id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid parameters for flow_resolve: missing start_id"
        );

        let err = McpError::Timeout {
            tool_name: "flow_resolve".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "Tool flow_resolve timed out after 250ms");
    }

    #[test]
    fn test_storage_error_conversion_to_app_error() {
        let storage_err = StorageError::QuestionNotFound {
            question_id: "q-1".to_string(),
        };
        let app_err: AppError = storage_err.into();
        assert!(matches!(app_err, AppError::Storage(_)));
    }

    #[test]
    fn test_storage_error_conversion_to_mcp_error() {
        let storage_err = StorageError::Query {
            message: "disk I/O error".to_string(),
        };
        let mcp_err: McpError = storage_err.into();
        assert!(matches!(mcp_err, McpError::ExecutionFailed { .. }));
        assert!(mcp_err.to_string().contains("disk I/O error"));
    }
}
