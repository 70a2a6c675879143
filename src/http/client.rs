//! # API Client
//!
//! Thin reqwest wrapper shared by every [`HttpCollection`](crate::http::HttpCollection).
//!
//! All traffic to the ledger API goes through [`ApiClient::send`], which is the only
//! place that attaches the bearer token and the only place that reacts to `401`.

use crate::auth::{AuthError, AuthGate, Session};
use crate::config::ApiConfig;
use crate::framework::SyncError;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Query string of a request that takes no parameters.
pub const NO_QUERY: [(&str, &str); 0] = [];

/// A decoded JSON response together with its status.
#[derive(Debug, Clone)]
pub struct Payload {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Payload {
    /// Deserializes the body; a shape mismatch is a server contract violation.
    pub fn decode<R: DeserializeOwned>(self) -> Result<R, SyncError> {
        let status = self.status;
        serde_json::from_value(self.body).map_err(|e| {
            warn!(status, error = %e, "Response did not match the expected shape");
            SyncError::Server {
                status,
                message: None,
            }
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Editable profile fields, as sent to `PUT /auth/profile`.
///
/// Fields left `None` are not sent and keep their current value on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
}

/// Failures of requests that change the stored session: `login`, `signup` and
/// profile updates.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Request(#[from] SyncError),

    /// The server answered 2xx without a token.
    #[error("Auth response carried no token")]
    MissingToken,

    #[error(transparent)]
    Store(#[from] AuthError),
}

/// HTTP client bound to one API base URL and one auth gate.
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Arc<AuthGate>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, auth: Arc<AuthGate>) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &Arc<AuthGate> {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Sends `request` with the current bearer token.
    ///
    /// Transport failures become [`SyncError::Network`]; any non-2xx status becomes
    /// [`SyncError::Server`] carrying the payload's `message` field when there is one.
    /// A `401` also invalidates the auth gate.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, SyncError> {
        let request = match self.auth.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Response");
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.auth.invalidate();
        }

        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| {
                body.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            });
        warn!(status = status.as_u16(), ?message, "Request failed");
        Err(SyncError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_for_payload(&self, request: RequestBuilder) -> Result<Payload, SyncError> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|e| {
                warn!(status, error = %e, "Response was not JSON");
                SyncError::Server {
                    status,
                    message: None,
                }
            })?
        };
        Ok(Payload { status, body })
    }

    pub async fn get<Q>(&self, path: &str, query: &Q) -> Result<Payload, SyncError>
    where
        Q: Serialize + ?Sized,
    {
        self.send_for_payload(self.request(Method::GET, path).query(query))
            .await
    }

    pub async fn get_json<Q, R>(&self, path: &str, query: &Q) -> Result<R, SyncError>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.get(path, query).await?.decode()
    }

    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, SyncError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_for_payload(self.request(Method::POST, path).json(body))
            .await?
            .decode()
    }

    pub async fn put_json<B, R>(&self, path: &str, body: &B) -> Result<R, SyncError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_for_payload(self.request(Method::PUT, path).json(body))
            .await?
            .decode()
    }

    pub async fn delete(&self, path: &str) -> Result<(), SyncError> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    /// `POST /auth/login`, signing the gate in on success.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, SessionError> {
        self.authenticate("auth/login", request).await
    }

    /// `POST /auth/signup`, signing the gate in on success.
    pub async fn signup(&self, request: &SignupRequest) -> Result<Session, SessionError> {
        self.authenticate("auth/signup", request).await
    }

    /// `GET /auth/profile`. The fresh profile replaces the one held by the gate.
    pub async fn profile(&self) -> Result<serde_json::Value, SessionError> {
        let user: serde_json::Value = self.get_json("auth/profile", &NO_QUERY).await?;
        self.auth.update_user(user.clone())?;
        Ok(user)
    }

    /// `PUT /auth/profile`, persisting the updated profile next to the token.
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<serde_json::Value, SessionError> {
        let user: serde_json::Value = self.put_json("auth/profile", update).await?;
        self.auth.update_user(user.clone())?;
        Ok(user)
    }

    async fn authenticate(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Session, SessionError> {
        let body: serde_json::Value = self.post_json(path, body).await?;
        let session = Session::from_auth_response(body).ok_or(SessionError::MissingToken)?;
        self.auth.sign_in(session.clone())?;
        Ok(session)
    }
}
