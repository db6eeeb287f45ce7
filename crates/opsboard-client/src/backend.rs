//! HTTP client for the identity backend.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use opsboard_auth::Role;
use opsboard_core::config::upstream::BackendConfig;
use opsboard_core::{AppError, AppResult};

use crate::tokens::TokenPair;

/// The user payload returned by the backend's session verification.
///
/// Unknown fields are carried through so `/auth/me` can relay whatever
/// profile data the backend attaches. A payload whose `role` is outside
/// the closed set fails deserialization and the session is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedUser {
    /// User ID as issued by the backend.
    pub id: String,
    /// Authoritative role, which may differ from the token's claim if the
    /// user was reassigned after issuance.
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An `/api` request to relay to the backend with a bearer attached.
#[derive(Debug)]
pub struct ForwardRequest<'a> {
    pub method: reqwest::Method,
    /// Original path and query, relayed verbatim.
    pub path_and_query: &'a str,
    pub bearer: &'a str,
    pub content_type: Option<&'a str>,
    pub accept: Option<&'a str>,
    pub body: Bytes,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    #[serde(flatten)]
    tokens: TokenPair,
    #[serde(default)]
    user: Option<serde_json::Value>,
}

/// A successful login: the minted token pair plus the user profile the
/// backend attached, if any.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub tokens: TokenPair,
    pub user: Option<serde_json::Value>,
}

/// Client for the identity backend: session verification, token refresh,
/// credential login, and bearer-authenticated API relays.
///
/// The backend is the authority on sessions. Every error path here is
/// conservative: transport failures are `BackendUnreachable`, rejected
/// sessions are `Authentication`, and a rejected refresh is
/// `RefreshExhausted`.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    verify_timeout: Duration,
}

impl BackendClient {
    /// Create a new client from backend configuration.
    pub fn new(config: &BackendConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build backend HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            verify_timeout: Duration::from_secs(config.verify_timeout_seconds),
        })
    }

    /// Ask the backend whether a bearer token names a live session.
    ///
    /// Any failure means the session does not verify: a 401, a malformed
    /// payload, and an unreachable backend are distinguished only in the
    /// error kind, never in the outcome.
    pub async fn verify_session(&self, token: &str) -> AppResult<VerifiedUser> {
        let response = self
            .http
            .get(format!("{}/auth/verify", self.base_url))
            .bearer_auth(token)
            .timeout(self.verify_timeout)
            .send()
            .await
            .map_err(|e| transport_error("session verification", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::authentication(format!(
                "Session rejected by backend ({status})"
            )));
        }

        response.json::<VerifiedUser>().await.map_err(|e| {
            AppError::with_source(
                opsboard_core::ErrorKind::Authentication,
                "Session verification returned a malformed user payload",
                e,
            )
        })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// A rejection or an unusable response is `RefreshExhausted`: no new
    /// token is obtainable and the caller must treat the session as
    /// unauthenticated.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let response = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| transport_error("token refresh", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::refresh_exhausted(format!(
                "Refresh rejected by backend ({status})"
            )));
        }

        let pair = response.json::<TokenPair>().await.map_err(|e| {
            AppError::with_source(
                opsboard_core::ErrorKind::RefreshExhausted,
                "Refresh response was malformed",
                e,
            )
        })?;

        if pair.access_token.is_empty() || pair.refresh_token.is_empty() {
            return Err(AppError::refresh_exhausted(
                "Refresh response carried an empty token",
            ));
        }

        debug!("token refresh succeeded");
        Ok(pair)
    }

    /// Exchange credentials for a token pair.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginOutcome> {
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| transport_error("login", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::authentication(format!(
                "Login rejected by backend ({status})"
            )));
        }

        let payload = response.json::<LoginPayload>().await.map_err(|e| {
            AppError::with_source(
                opsboard_core::ErrorKind::Authentication,
                "Login response was malformed",
                e,
            )
        })?;

        Ok(LoginOutcome {
            tokens: payload.tokens,
            user: payload.user,
        })
    }

    /// Tell the backend to terminate the session behind a bearer token.
    ///
    /// Best effort: the gateway clears its cookies regardless of the
    /// outcome, so callers typically only log a failure here.
    pub async fn logout(&self, token: &str) -> AppResult<()> {
        self.http
            .post(format!("{}/auth/logout", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| transport_error("logout", e))?;
        Ok(())
    }

    /// Relay an `/api` request with a bearer attached.
    ///
    /// The response is returned as-is, whatever the status: the refresh
    /// decision belongs to the caller.
    pub async fn forward(&self, request: ForwardRequest<'_>) -> AppResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        let mut builder = self
            .http
            .request(request.method, url)
            .bearer_auth(request.bearer);

        if let Some(content_type) = request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(accept) = request.accept {
            builder = builder.header(reqwest::header::ACCEPT, accept);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        builder
            .send()
            .await
            .map_err(|e| transport_error("API relay", e))
    }

    /// Whether the backend answers HTTP at all.
    ///
    /// Probes the verification endpoint without a bearer; any HTTP
    /// response, including a 401, counts as reachable.
    pub async fn health_probe(&self) -> bool {
        self.http
            .get(format!("{}/auth/verify", self.base_url))
            .timeout(self.verify_timeout)
            .send()
            .await
            .is_ok()
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> AppError {
    let detail = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "transport error"
    };
    AppError::with_source(
        opsboard_core::ErrorKind::BackendUnreachable,
        format!("Backend {context} failed: {detail}"),
        err,
    )
}
