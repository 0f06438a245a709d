use thiserror::Error;

/// Failures surfaced to the user at the interaction boundary.
///
/// None of these are fatal: the REPL and the dashboard render them inline
/// and keep running.
#[derive(Error, Debug)]
pub enum AppError {
    /// A required input was empty or out of range. Rendered as a warning.
    #[error("{0}")]
    Validation(String),
    /// No API credential is configured. The request was never attempted.
    #[error("{0}")]
    Authentication(String),
    /// The provider could not be reached or returned something unusable.
    #[error("API request failed: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn missing_key() -> Self {
        Self::Authentication(
            "OpenAI API key not provided. Enter a key or set OPENAI_API_KEY.".to_string(),
        )
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Warnings are recoverable by editing the input; everything else is an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_prefix() {
        let err = AppError::upstream("connection refused");
        assert_eq!(err.to_string(), "API request failed: connection refused");
    }

    #[test]
    fn test_only_validation_is_warning() {
        assert!(AppError::validation("empty").is_warning());
        assert!(!AppError::Authentication("no key".into()).is_warning());
        assert!(!AppError::upstream("boom").is_warning());
    }
}
