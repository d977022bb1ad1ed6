//! Errors reported by the client stores.

use reqwest::StatusCode;
use shared::{config::ConfigError, models::SurveyState};
use thiserror::Error;

use crate::storage::StorageError;

/// Message shown when a failure carries nothing more specific.
pub const GENERIC_ERROR_MESSAGE: &str = "server error";

/// Result alias used across the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Every failure a store operation can report.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the configured deadline.
    #[error("request timed out")]
    Timeout,

    /// HTTP 401. The session has already been cleared when this is returned.
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("session expired"))]
    Unauthorized {
        /// Backend message, if any.
        message: Option<String>,
    },

    /// HTTP 403.
    #[error("forbidden: {}", .message.as_deref().unwrap_or("access denied"))]
    Forbidden {
        /// Backend message, if any.
        message: Option<String>,
    },

    /// Any other non-2xx response.
    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        /// Response status.
        status: StatusCode,
        /// Backend message, if any.
        message: Option<String>,
    },

    /// A 2xx response whose envelope `status` is not `"success"`.
    #[error("{0}")]
    Application(String),

    /// The response body did not have the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Durable storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The configuration cannot produce a usable client or link.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A choice operation named a position past the end of the list.
    #[error("choice index {index} out of range for {len} choices")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of choices in the draft.
        len: usize,
    },

    /// A save on the same draft is still waiting for its response.
    #[error("a save is already in progress")]
    SaveInFlight,

    /// The cached state of a survey does not allow the requested change.
    #[error("cannot move survey from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: SurveyState,
        /// Requested state.
        to: SurveyState,
    },

    /// No route matches a path.
    #[error("unknown route: {0}")]
    UnknownRoute(String),
}

impl ClientError {
    /// Text suitable for a store's `error` field: the backend's own message
    /// when it sent one, the generic fallback otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { message: Some(message) }
            | Self::Forbidden { message: Some(message) }
            | Self::Status {
                message: Some(message),
                ..
            }
            | Self::Application(message) => message.clone(),
            Self::IndexOutOfRange { .. }
            | Self::SaveInFlight
            | Self::InvalidTransition { .. }
            | Self::UnknownRoute(_) => self.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// HTTP status of the response that produced this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Self::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
