use std::time::Duration;

use thiserror::Error;

/// Errors from the catalog API client.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("validation error (status {status}): {message}")]
    Validation { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// How callers react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Token missing, expired, or rejected. Clear the session.
    Auth,
    /// Remote store rejected the submitted fields.
    Validation,
    /// Transport failure or unexpected response.
    Network,
    /// Target no longer exists remotely.
    NotFound,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Http(_)
            | Self::Server { .. }
            | Self::Parse(_)
            | Self::Timeout(_)
            | Self::InvalidUrl(_) => ErrorKind::Network,
        }
    }

    /// Message suitable for a notification: the server's own text when it
    /// sent one, `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        let server_text = match self {
            Self::Auth(m) | Self::NotFound(m) => m.as_str(),
            Self::Validation { message, .. } | Self::Server { message, .. } => message.as_str(),
            _ => "",
        };
        if server_text.trim().is_empty() {
            fallback.to_string()
        } else {
            server_text.to_string()
        }
    }

    /// Map a non-success status and its body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => Self::Auth(message),
            404 => Self::NotFound(message),
            400..=499 => Self::Validation { status, message },
            _ => Self::Server { status, message },
        }
    }
}

/// Pull `msg` (or `message`) out of a JSON error body. Non-JSON bodies are
/// used as-is; JSON without a message field yields an empty string.
fn extract_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ["msg", "message", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .unwrap_or_default()
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(CatalogError::from_status(401, "").kind(), ErrorKind::Auth);
        assert_eq!(CatalogError::from_status(404, "").kind(), ErrorKind::NotFound);
        assert_eq!(
            CatalogError::from_status(400, "").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            CatalogError::from_status(409, "").kind(),
            ErrorKind::Validation
        );
        assert_eq!(CatalogError::from_status(500, "").kind(), ErrorKind::Network);
        assert_eq!(CatalogError::from_status(502, "").kind(), ErrorKind::Network);
    }

    #[test]
    fn test_message_extraction() {
        let err = CatalogError::from_status(400, r#"{"msg":"Serial name already exists"}"#);
        assert_eq!(
            err.user_message("Failed to save serial"),
            "Serial name already exists"
        );

        let err = CatalogError::from_status(401, r#"{"message":"Invalid credentials"}"#);
        assert_eq!(err.user_message("Login failed"), "Invalid credentials");

        let err = CatalogError::from_status(422, "  plain text  ");
        assert_eq!(err.user_message("x"), "plain text");
    }

    #[test]
    fn test_fallback_message() {
        let err = CatalogError::from_status(400, r#"{"status":false}"#);
        assert_eq!(err.user_message("Failed to save serial"), "Failed to save serial");

        let err = CatalogError::from_status(500, "");
        assert_eq!(err.user_message("Failed to delete"), "Failed to delete");

        let err = CatalogError::Timeout(Duration::from_secs(30));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.user_message("Failed to save episode"), "Failed to save episode");

        let err = CatalogError::Parse("missing field `data`".into());
        assert_eq!(err.user_message("Failed to fetch serials"), "Failed to fetch serials");
    }
}
