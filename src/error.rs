//! Unified error types for the save/publish API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Error returned by request handlers, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body is not JSON.
    #[error("Invalid JSON")]
    InvalidJson,

    /// Request body exceeds the configured limit.
    #[error("Request body too large")]
    PayloadTooLarge,

    /// `data` is missing or not a JSON object.
    #[error("No valid data provided")]
    InvalidData,

    /// Password did not match the configured credential.
    #[error("Invalid password")]
    InvalidPassword,

    /// Optimistic-lock marker did not match the persisted document.
    #[error("Data was modified by another user. Reload and try again.")]
    Conflict,

    /// Writing one of the persisted copies failed.
    #[error("{0}")]
    Storage(#[from] std::io::Error),

    /// Staging, committing or pushing failed.
    #[error("Git error: {0}")]
    Git(#[from] VcsError),

    /// No weather API key is configured.
    #[error("Weather API key not configured")]
    WeatherNotConfigured,

    /// Upstream weather call failed.
    #[error("Weather API error: {0}")]
    Weather(#[from] WeatherError),

    /// No route matched.
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    /// Map to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::InvalidData => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidPassword => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Git(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::WeatherNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Weather(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Version-control failures.
#[derive(Error, Debug)]
pub enum VcsError {
    /// The git binary could not be spawned.
    #[error("failed to run git {command}: {source}")]
    Spawn {
        /// Subcommand that failed to start.
        command: &'static str,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Git exited unsuccessfully.
    #[error("{output}")]
    CommandFailed {
        /// Subcommand that failed.
        command: &'static str,
        /// Captured stderr, or stdout when stderr was empty.
        output: String,
    },

    /// Path is outside the repository working tree.
    #[error("{path} is not inside the repository")]
    OutsideRepository {
        /// The offending path.
        path: String,
    },
}

/// Weather upstream failures.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// Transport error, including timeouts.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}")]
    Upstream {
        /// Upstream status code.
        status: u16,
    },

    /// Endpoint URL could not be built.
    #[error("invalid weather url: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::InvalidJson.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidData.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidPassword.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::PayloadTooLarge.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::Weather(WeatherError::Upstream { status: 503 }).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::WeatherNotConfigured.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn git_errors_carry_diagnostic() {
        let err = ApiError::from(VcsError::CommandFailed {
            command: "push",
            output: "fatal: could not read from remote".to_string(),
        });

        assert_eq!(err.to_string(), "Git error: fatal: could not read from remote");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn weather_errors_carry_upstream_status() {
        let err = ApiError::from(WeatherError::Upstream { status: 401 });
        assert_eq!(err.to_string(), "Weather API error: upstream returned 401");
    }
}
