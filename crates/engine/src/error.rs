// Error types for the FlowHunt client

use thiserror::Error;

/// Errors returned by [`crate::FlowApi`] operations
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found")]
    NotFound,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Response body returned by the service, if the error carries one
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status() {
        let err = ClientError::Api {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): invalid api key");
        assert_eq!(err.response_body(), Some("invalid api key"));
    }

    #[test]
    fn test_response_body_absent_for_other_errors() {
        assert!(ClientError::NotFound.response_body().is_none());
        let empty = ClientError::Api {
            status: 500,
            message: String::new(),
        };
        assert!(empty.response_body().is_none());
    }
}
