//! HTTP access to the survey backend.
//!
//! Two flavours share one type: the public client used for login, and the
//! authenticated client that injects the session's bearer token and reacts to
//! 401/403 responses by clearing the session and redirecting to the entry route.

use std::{fmt, sync::Arc, time::Duration};

use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use shared::{
    config::Config,
    models::{ApiEnvelope, ErrorResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{ClientError, ClientResult, GENERIC_ERROR_MESSAGE},
    routes::{ENTRY_ROUTE, Navigator},
    stores::session::SessionStore,
};

const USER_AGENT: &str = "votacion-client";

/// Collaborators consulted by the authenticated client.
#[derive(Clone)]
struct AuthContext {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("authenticated", &self.session.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Backend client with a fixed per-request deadline and no retries.
#[derive(Clone, Debug)]
pub struct HttpClient {
    api_root: Url,
    client: Client,
    auth: Option<AuthContext>,
}

impl HttpClient {
    /// Client without an `Authorization` header, only meant for login.
    ///
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn public(config: &Config) -> ClientResult<Self> {
        Ok(Self {
            api_root: config.api_root.clone(),
            client: build_client(config)?,
            auth: None,
        })
    }

    /// Client that authenticates every request with the session token.
    ///
    /// # Errors
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn authenticated(
        config: &Config,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        Ok(Self {
            api_root: config.api_root.clone(),
            client: build_client(config)?,
            auth: Some(AuthContext { session, navigator }),
        })
    }

    /// Whether requests carry the session token.
    #[must_use]
    pub fn is_authenticated_client(&self) -> bool {
        self.auth.is_some()
    }

    /// Joins path segments onto the API root, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Network(format!("invalid API root {}", self.api_root)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `GET` on the path built from `segments`, decoding the body as `T`.
    ///
    /// # Errors
    /// Returns a [`ClientError`] for transport failures, non-2xx statuses and
    /// undecodable bodies.
    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        self.execute(self.client.get(url)).await
    }

    /// Like [`get`](Self::get), with `query` serialized into the query string.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn get_with_query<T, Q>(&self, segments: &[&str], query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        self.execute(self.client.get(url).query(query)).await
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn post<T, B>(&self, segments: &[&str], body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        self.execute(self.client.post(url).json(body)).await
    }

    /// `PUT` with a JSON body.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn put<T, B>(&self, segments: &[&str], body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        self.execute(self.client.put(url).json(body)).await
    }

    /// `DELETE` on the path built from `segments`.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    pub async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        self.execute(self.client.delete(url)).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.as_ref().and_then(|auth| auth.session.token()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let request = self.authorize(request);
        let response = request.send().await.map_err(|err| {
            warn!(error = %err, timeout = err.is_timeout(), "request failed");
            ClientError::from(err)
        })?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "response received");
        if status.is_success() {
            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()));
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|body| body.message);
        Err(self.intercept(status, message))
    }

    /// Applies the global reaction to auth failures and builds the error the
    /// caller receives afterwards.
    fn intercept(&self, status: StatusCode, message: Option<String>) -> ClientError {
        match (status, &self.auth) {
            (StatusCode::UNAUTHORIZED, Some(auth)) => {
                warn!("401 from backend, clearing session");
                auth.session.logout();
                auth.navigator.redirect(ENTRY_ROUTE);
                ClientError::Unauthorized { message }
            }
            (StatusCode::FORBIDDEN, Some(auth)) => {
                warn!("403 from backend, leaving protected view");
                auth.navigator.redirect(ENTRY_ROUTE);
                ClientError::Forbidden { message }
            }
            _ => ClientError::Status { status, message },
        }
    }
}

fn build_client(config: &Config) -> ClientResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?)
}

/// Payload of a `"success"` envelope, or an application error.
///
/// # Errors
/// Returns [`ClientError::Application`] carrying the backend message or the
/// generic fallback.
pub fn unwrap_envelope<T>(envelope: ApiEnvelope<T>) -> ClientResult<T> {
    envelope
        .into_result()
        .map_err(|err| ClientError::Application(err.message_or(GENERIC_ERROR_MESSAGE).to_string()))
}

/// Like [`unwrap_envelope`] for endpoints whose payload is irrelevant.
///
/// # Errors
/// Returns [`ClientError::Application`] when the envelope is not successful.
pub fn expect_success<T>(envelope: ApiEnvelope<T>) -> ClientResult<()> {
    if envelope.is_success() {
        Ok(())
    } else {
        Err(ClientError::Application(
            envelope
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        ))
    }
}
