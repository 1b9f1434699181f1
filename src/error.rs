//! Error types for the Parley library.
//!
//! All fallible operations return [`ApiError`]. Remote-call failures keep
//! their HTTP status so callers can distinguish auth problems from service
//! rejections.

use thiserror::Error;

/// Errors surfaced by agent modeling, export, and connector operations.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid agent definition: {0}")]
    ValidationError(String),

    #[error("Language data error: {0}")]
    LanguageError(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Service error (status {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Intent not found in agent definition: {0}")]
    IntentNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ApiError::ServiceError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}

impl ApiError {
    /// Map a non-success HTTP status and response body to the right variant.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized(body),
            _ => ApiError::ServiceError {
                status,
                message: body,
            },
        }
    }

    /// True when the error came from the transport rather than the service.
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_auth() {
        assert!(matches!(
            ApiError::from_status(401, "no token".to_string()),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_status(403, "forbidden".to_string()),
            ApiError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_from_status_service() {
        match ApiError::from_status(400, "bad agent".to_string()) {
            ApiError::ServiceError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad agent");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
