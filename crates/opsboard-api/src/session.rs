//! Authoritative, request-scoped session verification.
//!
//! This is the slow tier of the trust model: the identity backend is asked
//! whether the bearer token names a live session. The route gate's local
//! check never replaces this; it only keeps obviously dead tokens from
//! reaching the backend at all.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use opsboard_client::backend::VerifiedUser;

use crate::state::AppState;

/// A session the backend has confirmed for the current request.
///
/// Stored in the request extensions after the first verification, so
/// repeated checks within one request cost one backend call at most.
/// Only successes are memoized; a failed verification is re-attempted
/// if asked again.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    /// The authoritative user payload.
    pub user: VerifiedUser,
    /// The bearer token the session was verified with.
    pub token: String,
}

/// Rejection for a request whose session does not verify: a redirect to
/// the login page. Network failure, a backend 401, and a malformed
/// payload all fail closed to the same place.
#[derive(Debug, Clone)]
pub struct SessionRedirect {
    location: String,
}

impl SessionRedirect {
    /// Redirect to the configured login page.
    pub fn to_login(state: &AppState) -> Self {
        Self {
            location: state.policy.login_path().to_string(),
        }
    }

    /// Where this redirect points.
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for SessionRedirect {
    fn into_response(self) -> Response {
        Redirect::temporary(&self.location).into_response()
    }
}

/// Verify the request's session against the backend, memoized per request.
pub async fn verify_session(
    state: &AppState,
    parts: &mut Parts,
) -> Result<VerifiedSession, SessionRedirect> {
    if let Some(cached) = parts.extensions.get::<VerifiedSession>() {
        return Ok(cached.clone());
    }

    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token) = state.cookies.access_token(&jar) else {
        debug!("session verification without an access token");
        return Err(SessionRedirect::to_login(state));
    };

    match state.backend.verify_session(&token).await {
        Ok(user) => {
            let session = VerifiedSession { user, token };
            parts.extensions.insert(session.clone());
            Ok(session)
        }
        Err(err) => {
            debug!(kind = ?err.kind, error = %err, "session verification failed");
            Err(SessionRedirect::to_login(state))
        }
    }
}

impl FromRequestParts<AppState> for VerifiedSession {
    type Rejection = SessionRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        verify_session(state, parts).await
    }
}
