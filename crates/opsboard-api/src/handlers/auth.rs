//! Auth handlers: login, logout, refresh, me.
//!
//! All of these relay to the identity backend; the gateway's own
//! contribution is the cookie handling. Token values never appear in
//! response bodies.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};
use validator::Validate;

use opsboard_client::backend::VerifiedUser;
use opsboard_core::{AppError, ErrorKind};

use crate::dto::request::LoginRequest;
use crate::dto::response::{ApiResponse, MessageResponse, SessionResponse};
use crate::error::ApiError;
use crate::session::VerifiedSession;
use crate::state::AppState;

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let outcome = state.backend.login(&req.username, &req.password).await?;
    let jar = state.cookies.store(&outcome.tokens);

    info!(username = %req.username, "login succeeded");

    Ok((
        jar,
        Json(ApiResponse::ok(SessionResponse {
            user: outcome.user,
            access_expires_at: outcome.tokens.access_expires_at,
            refresh_expires_at: outcome.tokens.refresh_expires_at,
        })),
    ))
}

/// POST /auth/logout
///
/// Clears the cookies unconditionally; the backend call is best effort.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    if let Some(token) = state.cookies.access_token(&jar) {
        if let Err(err) = state.backend.logout(&token).await {
            debug!(error = %err, "backend logout failed, clearing cookies anyway");
        }
    }

    (
        state.cookies.clear(),
        Json(ApiResponse::ok(MessageResponse {
            message: "Signed out".to_string(),
        })),
    )
}

/// POST /auth/refresh
///
/// Exchanges the refresh cookie for a new pair and rotates both cookies.
/// An exhausted refresh clears the cookies; a transient backend failure
/// does not, since the credential may still be good.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(refresh_token) = state.cookies.refresh_token(&jar) else {
        return ApiError::from(AppError::authentication("No refresh token")).into_response();
    };

    match state.refresh_gate.refresh(&refresh_token).await {
        Ok(pair) => {
            let body = Json(ApiResponse::ok(SessionResponse {
                user: None,
                access_expires_at: pair.access_expires_at,
                refresh_expires_at: pair.refresh_expires_at,
            }));
            (state.cookies.store(&pair), body).into_response()
        }
        Err(err) if err.kind == ErrorKind::RefreshExhausted => {
            info!(error = %err, "refresh exhausted, ending session");
            (state.cookies.clear(), ApiError::from(err)).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// GET /auth/me
///
/// Requires an authoritatively verified session; the extractor redirects
/// to login otherwise.
pub async fn me(session: VerifiedSession) -> Json<ApiResponse<VerifiedUser>> {
    Json(ApiResponse::ok(session.user))
}
