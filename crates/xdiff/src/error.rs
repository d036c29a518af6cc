//! Error types for the dialect layer and connection manager.

use thiserror::Error;

/// Main error type for dialect rendering and connection operations.
///
/// Every engine-native failure is wrapped into exactly one of these
/// variants before it reaches the caller; the original engine text is kept
/// verbatim in the message.
#[derive(Error, Debug)]
pub enum DiffError {
    /// Connection or session establishment failed.
    #[error("Connection failed: {message}")]
    Connect { message: String },

    /// A statement failed to execute.
    #[error("Query failed: {message}\n  SQL: {sql}")]
    Query { message: String, sql: String },

    /// The requested SQL shape has no representation in this dialect.
    #[error("{operation} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: String,
        operation: String,
    },

    /// Configuration error (invalid YAML, missing fields, bad identifiers, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The native driver bridge could not be started or was already torn down.
    #[error("Driver bridge error: {0}")]
    Bridge(String),

    /// The session or worker pool has been closed.
    #[error("Connection is closed")]
    Closed,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DiffError {
    /// Create a Connect error carrying the driver's message.
    pub fn connect(message: impl Into<String>) -> Self {
        DiffError::Connect {
            message: message.into(),
        }
    }

    /// Create a Query error carrying the driver's message and the failed SQL.
    pub fn query(message: impl Into<String>, sql: impl Into<String>) -> Self {
        DiffError::Query {
            message: message.into(),
            sql: sql.into(),
        }
    }

    /// Create an Unsupported error for a dialect operation.
    pub fn unsupported(dialect: impl Into<String>, operation: impl Into<String>) -> Self {
        DiffError::Unsupported {
            dialect: dialect.into(),
            operation: operation.into(),
        }
    }

    /// Whether a caller may reasonably retry the failed operation.
    ///
    /// Connect and Query failures may be transient. Unsupported shapes and
    /// configuration problems never go away on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DiffError::Connect { .. } | DiffError::Query { .. })
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for dialect and connection operations.
pub type Result<T> = std::result::Result<T, DiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_keeps_driver_text() {
        let err = DiffError::query("ORA-00942: table or view does not exist", "SELECT * FROM T");
        let text = err.to_string();
        assert!(text.contains("ORA-00942: table or view does not exist"));
        assert!(text.contains("SELECT * FROM T"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(DiffError::connect("refused").is_retryable());
        assert!(DiffError::query("deadlock", "UPDATE t SET a = 1").is_retryable());
        assert!(!DiffError::unsupported("oceanbase", "OFFSET").is_retryable());
        assert!(!DiffError::Config("bad".into()).is_retryable());
        assert!(!DiffError::Closed.is_retryable());
    }

    #[test]
    fn test_unsupported_message() {
        let err = DiffError::unsupported("oceanbase", "OFFSET pagination");
        assert_eq!(
            err.to_string(),
            "OFFSET pagination is not supported by the oceanbase dialect"
        );
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.yaml");
        let err = DiffError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: missing.yaml"));
    }
}
