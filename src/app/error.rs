use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MontageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing template variable '{variable}' in {template}")]
    MissingTemplateVariable { variable: String, template: String },

    #[error("Server error {status} from {url}")]
    ServerError { status: u16, url: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Invalid composite content: {0}")]
    InvalidComposite(String),

    #[error("Provider panicked: {0}")]
    ProviderPanicked(String),
}

impl MontageError {
    /// Whether another attempt may succeed: transport failures, timeouts
    /// and 5xx responses. Configuration problems and panics are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MontageError::Http(_) | MontageError::ServerError { .. } | MontageError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MontageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = MontageError::ServerError {
            status: 503,
            url: "http://example.com".into(),
        };
        assert!(err.is_retryable());
        assert!(MontageError::Timeout(Duration::from_millis(10)).is_retryable());
    }

    #[test]
    fn test_config_errors_are_final() {
        assert!(!MontageError::Config("bad".into()).is_retryable());
        assert!(!MontageError::CircuitOpen.is_retryable());
        assert!(!MontageError::ProviderPanicked("boom".into()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = MontageError::MissingTemplateVariable {
            variable: "id".into(),
            template: "http://example.com/{id}".into(),
        };
        assert_eq!(
            err.to_string(),
            "Missing template variable 'id' in http://example.com/{id}"
        );
    }
}
