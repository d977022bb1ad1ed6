//! The `{status, data, message}` envelope shared by the REST endpoints.

use serde::{Deserialize, Serialize};

/// Status value the backend uses for successful responses.
pub const SUCCESS_STATUS: &str = "success";

/// Response envelope wrapping every admin and survey endpoint.
///
/// A response is successful only when `status` is `"success"`; any other value
/// carries an application error described by `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    /// `"success"` or an error discriminator chosen by the backend.
    pub status: String,
    /// Payload, present on success.
    pub data: Option<T>,
    /// Human readable error message.
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Builds a successful envelope around `data`.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: SUCCESS_STATUS.to_string(),
            data: Some(data),
            message: None,
        }
    }

    /// Returns `true` when the backend reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Splits the envelope into its payload or an [`ErrorResponse`].
    ///
    /// A successful envelope without `data` is reported as an error too, since
    /// every caller needs the payload.
    ///
    /// # Errors
    /// Returns the error body when `status` is not `"success"` or `data` is missing.
    pub fn into_result(self) -> Result<T, ErrorResponse> {
        if !self.is_success() {
            return Err(ErrorResponse {
                status: self.status,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| ErrorResponse {
            status: self.status,
            message: Some("response is missing its data payload".to_string()),
        })
    }
}

/// Error body returned by the backend, either inside a non-success envelope or
/// as the body of a non-2xx response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error discriminator, empty when the body had none.
    #[serde(default)]
    pub status: String,
    /// Human readable error message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorResponse {
    /// Returns the backend message, or `fallback` when the backend sent none.
    #[must_use]
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.status, message),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for ErrorResponse {}

/// Payload of a successful create request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedSurvey {
    /// Identifier assigned by the backend.
    pub uuid: String,
}
