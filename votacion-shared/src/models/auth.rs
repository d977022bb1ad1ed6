//! Login exchange and the session user record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Credentials posted to `/api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Plain password, only ever sent over the login request.
    pub password: String,
}

/// Body returned by `/api/auth/login`.
///
/// The login endpoint is not wrapped in the usual envelope: a response is
/// successful when it carries a non-empty `token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    /// Bearer token for later requests.
    #[serde(default)]
    pub token: Option<String>,
    /// The authenticated user.
    #[serde(default)]
    pub user: Option<SessionUser>,
    /// Explanation sent with a rejected login.
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginResponse {
    /// The token, when the backend issued a usable one.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }
}

/// The authenticated user record as returned by the backend.
///
/// The client never interprets the record beyond a few display helpers, so it
/// is kept as the raw JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SessionUser(pub Map<String, Value>);

impl SessionUser {
    /// Returns `true` for the `{}` record stored when nobody is logged in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a string attribute.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Best available label: name, then username, then email.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        ["name", "username", "email"]
            .into_iter()
            .find_map(|key| self.get_str(key))
    }
}
