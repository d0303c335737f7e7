//! GCP client error types

use thiserror::Error;

/// GCP client specific error
#[derive(Debug, Error)]
pub enum GcpError {
    /// Service account key could not be read or parsed
    #[error("invalid credentials file '{path}': {message}")]
    Credentials { path: String, message: String },

    /// Token could not be minted or exchanged
    #[error("failed to obtain access token: {message}")]
    Token { message: String },

    /// Transport-level failure (DNS, TLS, timeout, ...)
    #[error("{context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response from a Google API
    #[error("{context}: HTTP {status}: {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("unexpected response from {context}: {message}")]
    UnexpectedResponse { context: String, message: String },
}

impl GcpError {
    /// Create token error
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn request(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            context: context.into(),
            source,
        }
    }

    /// Create unexpected-response error
    pub fn unexpected(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, GcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        let err = GcpError::Api {
            context: "tables.get".into(),
            status: 404,
            message: "Not found: Table p:d.t".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(
            err.to_string(),
            "tables.get: HTTP 404: Not found: Table p:d.t"
        );
    }

    #[test]
    fn test_token_error_has_no_status() {
        assert_eq!(GcpError::token("expired").status(), None);
    }
}
