//! Error types for the financial chatbot

use thiserror::Error;

/// Result type alias for chatbot operations
pub type Result<T> = std::result::Result<T, ChatbotError>;

/// Reasons a dataset could not be turned into a session
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Unsupported file type '{0}'. Use 'csv' or 'json'.")]
    UnsupportedFormat(String),

    #[error("Unable to read data source: {0}")]
    Unreadable(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(String),

    #[error("Failed to parse JSON: {0}")]
    Json(String),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid value in row {row}, column '{column}': {value}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Data source contains no records")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ChatbotError {

    // =============================
    // Caller-recoverable Errors
    // =============================

    #[error("Failed to load data: {0}")]
    Load(#[from] LoadError),

    #[error("Please upload a data file first")]
    NoActiveSession,

    // =============================
    // Internal Faults
    // =============================

    #[error("Internal consistency fault: {0}")]
    InternalConsistency(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl ChatbotError {
    /// Whether the caller can fix this by supplying different input
    pub fn is_user_error(&self) -> bool {
        matches!(self, ChatbotError::Load(_) | ChatbotError::NoActiveSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        assert!(ChatbotError::NoActiveSession.is_user_error());
        assert!(ChatbotError::Load(LoadError::Empty).is_user_error());
        assert!(!ChatbotError::InternalConsistency("x".into()).is_user_error());
    }

    #[tokio::test]
    async fn test_failed_background_task_is_internal() {
        let join_error = tokio::task::spawn_blocking(|| panic!("parser crashed"))
            .await
            .unwrap_err();
        let err = ChatbotError::from(join_error);
        assert!(matches!(err, ChatbotError::TaskFailed(_)));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_no_session_message() {
        assert_eq!(
            ChatbotError::NoActiveSession.to_string(),
            "Please upload a data file first"
        );
    }
}
