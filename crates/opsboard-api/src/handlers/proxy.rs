//! Relay handlers: `/api` calls to the backend, gated pages to the frontend.

use axum::Json;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};

use opsboard_auth::Claims;
use opsboard_client::backend::ForwardRequest;
use opsboard_core::{AppError, ErrorKind};

use crate::error::{ApiError, ApiErrorResponse};
use crate::session;
use crate::state::AppState;

/// ANY /api/{*path}
///
/// Relays the call to the backend with the access cookie as a bearer. On
/// a 401, refreshes through the single-flight gate and retries exactly
/// once with the new token; the retry's response is relayed as-is, even a
/// second 401. A successful refresh rotates both cookies on the response.
pub async fn api_proxy(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
) -> Result<Response, ApiError> {
    let path_and_query = path_and_query(&request);
    let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
        .map_err(|_| AppError::validation("Unsupported HTTP method"))?;
    let content_type = header_str(request.headers(), header::CONTENT_TYPE);
    let accept = header_str(request.headers(), header::ACCEPT);

    let Some(access) = state.cookies.access_token(&jar) else {
        return Err(AppError::authentication("No access token").into());
    };

    let body = to_bytes(request.into_body(), state.config.server.max_body_bytes)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Validation, "Request body unreadable or too large", e)
        })?;

    let first = state
        .backend
        .forward(ForwardRequest {
            method: method.clone(),
            path_and_query: &path_and_query,
            bearer: &access,
            content_type: content_type.as_deref(),
            accept: accept.as_deref(),
            body: body.clone(),
        })
        .await?;

    if first.status() != reqwest::StatusCode::UNAUTHORIZED {
        return Ok(relay_response(first).await);
    }

    debug!(path = %path_and_query, "API relay got 401, attempting refresh");

    let Some(refresh) = state.cookies.refresh_token(&jar) else {
        debug!("no refresh token, ending session");
        return Ok(unauthenticated(&state));
    };

    let pair = match state.refresh_gate.refresh(&refresh).await {
        Ok(pair) => pair,
        Err(err) if err.kind == ErrorKind::RefreshExhausted => {
            info!(error = %err, "refresh exhausted, ending session");
            return Ok(unauthenticated(&state));
        }
        Err(err) => return Err(err.into()),
    };

    let second = state
        .backend
        .forward(ForwardRequest {
            method,
            path_and_query: &path_and_query,
            bearer: &pair.access_token,
            content_type: content_type.as_deref(),
            accept: accept.as_deref(),
            body,
        })
        .await?;

    let response = relay_response(second).await;
    Ok((state.cookies.store(&pair), response).into_response())
}

/// Fallback for everything that is not a gateway-owned route: a page
/// navigation.
///
/// The route gate has already vetted the token locally. Here the session
/// is verified against the backend and the policy is re-checked with the
/// authoritative role, which catches tokens whose role claim has gone
/// stale since issuance. Only then is the page fetched from the frontend
/// origin.
pub async fn page_proxy(State(state): State<AppState>, request: Request) -> Response {
    let path_and_query = path_and_query(&request);
    let path = request.uri().path().to_string();
    let accept = header_str(request.headers(), header::ACCEPT);
    let (mut parts, _body) = request.into_parts();

    // Public pages and the unauthorized page are served without a session.
    if state.policy.is_public(&path) || state.policy.is_unauthorized_page(&path) {
        return forward_page(&state, &path_and_query, accept.as_deref()).await;
    }

    let session = match session::verify_session(&state, &mut parts).await {
        Ok(session) => session,
        Err(redirect) => return redirect.into_response(),
    };

    let allowed = state.policy.roles_for(&path);
    if let Err(err) = state.policy.require_role(session.user.role, &allowed) {
        // The claimed role passed the gate, so a denial here means the
        // token's role claim has gone stale against the backend.
        let claimed = parts.extensions.get::<Claims>().map(|c| c.role);
        info!(
            path = %path,
            role = %session.user.role,
            claimed = ?claimed,
            error = %err,
            "authoritative role re-check denied"
        );
        return Redirect::temporary(state.policy.unauthorized_path()).into_response();
    }

    forward_page(&state, &path_and_query, accept.as_deref()).await
}

async fn forward_page(state: &AppState, path_and_query: &str, accept: Option<&str>) -> Response {
    match state.frontend.fetch_page(path_and_query, accept).await {
        Ok(upstream) => relay_response(upstream).await,
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Buffer an upstream response and re-emit it with the same status and
/// content type.
///
/// Statuses and headers are rebuilt rather than passed through as types,
/// so the axum and reqwest http versions stay decoupled.
async fn relay_response(upstream: reqwest::Response) -> Response {
    let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let body = match upstream.bytes().await {
        Ok(body) => body,
        Err(err) => {
            return ApiError::from(AppError::with_source(
                ErrorKind::BackendUnreachable,
                "Upstream body read failed",
                err,
            ))
            .into_response();
        }
    };

    let mut response = (status, body).into_response();
    if let Some(value) = content_type.and_then(|ct| header::HeaderValue::from_str(&ct).ok()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

/// 401 with both cookies cleared: the session is over and the caller must
/// sign in again.
fn unauthenticated(state: &AppState) -> Response {
    let body = ApiErrorResponse {
        error: "SESSION_EXPIRED".to_string(),
        message: "Session expired, sign in again".to_string(),
        details: None,
    };
    (StatusCode::UNAUTHORIZED, state.cookies.clear(), Json(body)).into_response()
}

fn path_and_query(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
