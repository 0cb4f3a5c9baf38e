use serde::Serialize;
use std::fmt;

/// Result alias used throughout the core
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Failures surfaced by the monitoring core
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Malformed or missing required input
    #[error("{0}")]
    Validation(String),
    /// A referenced user or keyword does not exist
    #[error("{0}")]
    NotFound(String),
    /// A unique constraint was violated
    #[error("{0}")]
    Duplicate(String),
    /// The search provider was unreachable or answered with an error status
    #[error("search provider failure: {message}")]
    ProviderTransport {
        status: Option<u16>,
        message: String,
    },
    /// The search provider answered with a payload we cannot interpret
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    /// The persistence backend failed
    #[error("storage error: {0}")]
    Storage(String),
}

/// Machine-readable error kind, stable across releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    NotFound,
    Duplicate,
    SearchError,
    MalformedResponse,
    StorageError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::SearchError => "search_error",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::StorageError => "storage_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MonitorError {
    pub fn validation(message: impl Into<String>) -> Self {
        MonitorError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        MonitorError::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Validation(_) => ErrorKind::ValidationError,
            MonitorError::NotFound(_) => ErrorKind::NotFound,
            MonitorError::Duplicate(_) => ErrorKind::Duplicate,
            MonitorError::ProviderTransport { .. } => ErrorKind::SearchError,
            MonitorError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            MonitorError::Storage(_) => ErrorKind::StorageError,
        }
    }
}

impl From<tokio_postgres::Error> for MonitorError {
    fn from(err: tokio_postgres::Error) -> Self {
        MonitorError::Storage(postgres_message(&err))
    }
}

/// Server-side errors display only as "db error"; pull the detail out of them
fn postgres_message(err: &tokio_postgres::Error) -> String {
    if let Some(db) = err.as_db_error() {
        let mut message = format!("{} (SQLSTATE {})", db.message(), db.code().code());
        if let Some(detail) = db.detail() {
            message.push_str(": ");
            message.push_str(detail);
        }
        return message;
    }

    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

impl From<deadpool_postgres::PoolError> for MonitorError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        MonitorError::Storage(format!("connection pool: {}", err))
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        MonitorError::ProviderTransport {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(
            MonitorError::validation("no keywords available").kind().as_str(),
            "validation_error"
        );
        let err = MonitorError::ProviderTransport {
            status: Some(503),
            message: "service unavailable".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::SearchError);
        assert_eq!(
            err.to_string(),
            "search provider failure: service unavailable"
        );
    }

    #[tokio::test]
    #[ignore] // Requires a PostgreSQL database, see DATABASE_URL
    async fn test_postgres_error_keeps_server_message() {
        use crate::config::DatabaseConfig;
        use crate::db_connection::create_pool;

        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/test".to_string());
        let pool = create_pool(&DatabaseConfig { url, pool_size: 1 }).unwrap();
        let client = pool.get().await.unwrap();

        let err = client.execute("SELEC 1", &[]).await.unwrap_err();
        let message = MonitorError::from(err).to_string();
        assert!(message.contains("syntax error"), "{}", message);
        assert!(message.contains("42601"), "{}", message);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::MalformedResponse).unwrap();
        assert_eq!(json, "\"malformed_response\"");
    }
}
