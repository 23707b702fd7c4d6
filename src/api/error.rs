//! Error types for backend requests.

use thiserror::Error;

/// Errors that can occur when talking to the monitoring backend.
///
/// The display text is shown verbatim in the views, so variants carry the
/// underlying transport message rather than a structured code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend answered with a non-success status.
    #[error("Request failed with status {0}")]
    Status(reqwest::StatusCode),

    /// Connection to the backend failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(String),

    /// Any other transport failure.
    #[error("HTTP request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status(status)
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_includes_reason() {
        let err = ApiError::Status(reqwest::StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Request failed with status 404 Not Found");
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let err: ApiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
