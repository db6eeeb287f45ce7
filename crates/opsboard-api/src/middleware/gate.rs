//! The local route gate for page navigations.
//!
//! Decides redirects from the cookie and the token alone: no network, no
//! backend calls. The authoritative session check happens later, in the
//! page handler, for requests that pass this gate.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use crate::state::AppState;

/// Gate a page navigation by the token cookie and the route policy.
///
/// Outcomes, in order:
/// - the unauthorized page always passes, so a denial cannot loop on itself
/// - public paths pass, except that a fully verified session bounces to
///   the landing page; a merely present but invalid token falls through
///   to the page rather than bouncing, which would loop
/// - no token, or a token that fails local verification: redirect to login
/// - a role not allowed for the path: redirect to the unauthorized page
/// - otherwise the request proceeds, with the verified claims stored in
///   the request extensions for downstream handlers to log against
pub async fn route_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if state.policy.is_unauthorized_page(&path) {
        return next.run(request).await;
    }

    let token = state.cookies.access_token(&jar);

    if state.policy.is_public(&path) {
        if let Some(token) = &token {
            if state.verifier.verify(token).is_ok() {
                debug!(path = %path, "verified session on public path, bouncing to landing");
                return Redirect::temporary(state.policy.default_landing()).into_response();
            }
        }
        return next.run(request).await;
    }

    let Some(token) = token else {
        debug!(path = %path, "no access token, redirecting to login");
        return Redirect::temporary(state.policy.login_path()).into_response();
    };

    let claims = match state.verifier.verify(&token) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(path = %path, error = %err, "token failed local verification, redirecting to login");
            return Redirect::temporary(state.policy.login_path()).into_response();
        }
    };

    if !state.policy.is_allowed(claims.role, &path) {
        info!(path = %path, role = %claims.role, sub = %claims.sub, "role not allowed for route");
        return Redirect::temporary(state.policy.unauthorized_path()).into_response();
    }

    request.extensions_mut().insert(claims);
    next.run(request).await
}
