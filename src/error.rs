//! Error types for rfxgen
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in rfxgen
///
/// Recoverable conditions never show up here: a reply without extractable
/// code and a failed or timed-out compile are ordinary loop events and are
/// handled in place. The variants below end the session.
#[derive(Debug, Error)]
pub enum RfxgenError {
    /// ReflexScript compiler binary missing or not executable
    #[error("reflexc not found: {0}")]
    CompilerMissing(String),

    /// vLLM server failed its health probe
    #[error("LLM server unreachable: {0}")]
    ServerUnreachable(String),

    /// LLM server rejected our credentials; retrying cannot help
    #[error("LLM server rejected request with HTTP {0}")]
    AuthRejected(u16),

    /// LLM API error (transport, protocol, unexpected payload)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RfxgenError {
    /// Whether the loop may keep going after observing this error.
    ///
    /// Transport-level LLM failures burn the current iteration but the
    /// session continues; everything else aborts it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RfxgenError::Llm(_))
    }
}

/// Result type alias for rfxgen operations
pub type Result<T> = std::result::Result<T, RfxgenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_missing_error() {
        let err = RfxgenError::CompilerMissing("/opt/reflex/bin/reflexc".to_string());
        assert_eq!(err.to_string(), "reflexc not found: /opt/reflex/bin/reflexc");
    }

    #[test]
    fn test_server_unreachable_error() {
        let err = RfxgenError::ServerUnreachable("http://localhost:8000".to_string());
        assert_eq!(err.to_string(), "LLM server unreachable: http://localhost:8000");
    }

    #[test]
    fn test_auth_rejected_error() {
        let err = RfxgenError::AuthRejected(401);
        assert_eq!(err.to_string(), "LLM server rejected request with HTTP 401");
    }

    #[test]
    fn test_llm_error() {
        let err = RfxgenError::Llm("connection reset".to_string());
        assert_eq!(err.to_string(), "LLM error: connection reset");
    }

    #[test]
    fn test_config_error() {
        let err = RfxgenError::Config("max_iterations must be at least 1".to_string());
        assert_eq!(err.to_string(), "Config error: max_iterations must be at least 1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RfxgenError = io_err.into();
        assert!(matches!(err, RfxgenError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: RfxgenError = json_err.into();
        assert!(matches!(err, RfxgenError::Json(_)));
    }

    #[test]
    fn test_recoverability() {
        assert!(RfxgenError::Llm("timeout".to_string()).is_recoverable());
        assert!(!RfxgenError::AuthRejected(403).is_recoverable());
        assert!(!RfxgenError::CompilerMissing("reflexc".to_string()).is_recoverable());
        assert!(!RfxgenError::ServerUnreachable("host".to_string()).is_recoverable());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(RfxgenError::Config("test".to_string()))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }
}
