//! Shared test helpers for integration tests.
//!
//! Each test gets its own gateway router plus a mock upstream serving
//! both the identity backend endpoints and the frontend pages on an
//! OS-assigned port. The mock counts every call so tests can assert
//! which tier of the gateway actually went over the wire.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use opsboard_auth::{Claims, Role};
use opsboard_core::config::AppConfig;

/// Shared secret both the mock upstream and the gateway sign with.
pub const TEST_SECRET: &str = "integration-test-secret";

/// Test application context
pub struct TestApp {
    /// The gateway router for making test requests
    pub router: Router,
    /// Gateway config the router was built from
    pub config: AppConfig,
    /// Mock upstream state: counters and registries
    pub upstream: Arc<UpstreamState>,
}

impl TestApp {
    /// Gateway wired to a live mock upstream.
    pub async fn new() -> Self {
        let upstream = Arc::new(UpstreamState::default());
        let addr = spawn_upstream(Arc::clone(&upstream)).await;

        let config = gateway_config(addr);
        let state = opsboard_api::build_state(config.clone()).expect("Failed to build state");
        let router = opsboard_api::build_router(state);

        Self {
            router,
            config,
            upstream,
        }
    }

    /// Gateway whose backend address has nothing listening on it.
    pub async fn with_dead_backend() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind throwaway listener");
        let addr = listener.local_addr().expect("No local addr");
        drop(listener);

        let config = gateway_config(addr);
        let state = opsboard_api::build_state(config.clone()).expect("Failed to build state");
        let router = opsboard_api::build_router(state);

        Self {
            router,
            config,
            upstream: Arc::new(UpstreamState::default()),
        }
    }

    /// Make an HTTP request to the gateway.
    ///
    /// `cookies` is a raw `Cookie` header value, e.g. `"accessToken=x"`.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookies: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_string(&body).expect("Failed to serialize body"),
                )),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

fn gateway_config(upstream_addr: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.token_secret = TEST_SECRET.to_string();
    config.auth.leeway_seconds = 0;
    config.backend.base_url = format!("http://{upstream_addr}");
    config.backend.verify_timeout_seconds = 2;
    config.backend.request_timeout_seconds = 5;
    config.frontend.base_url = format!("http://{upstream_addr}");
    config
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` for non-JSON responses
    pub body: Value,
    /// Raw body text
    pub text: String,
}

impl TestResponse {
    /// The `Location` header, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// All `Set-Cookie` headers.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// The value a `Set-Cookie` header assigns to `name`, if any.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookies().iter().find_map(|raw| {
            let pair = raw.split(';').next().unwrap_or(raw);
            let (cookie_name, value) = pair.split_once('=')?;
            (cookie_name.trim() == name).then(|| value.to_string())
        })
    }

    /// Whether the response expires the named cookie.
    pub fn clears_cookie(&self, name: &str) -> bool {
        self.set_cookies()
            .iter()
            .any(|raw| raw.starts_with(&format!("{name}=")) && raw.contains("Max-Age=0"))
    }
}

/// Mint a signed access token the gateway's local verifier accepts.
pub fn mint_token(sub: &str, role: Role, ttl_seconds: i64) -> String {
    mint_token_with_secret(TEST_SECRET, sub, role, ttl_seconds)
}

/// Mint a token signed with an arbitrary secret.
pub fn mint_token_with_secret(secret: &str, sub: &str, role: Role, ttl_seconds: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        role,
        iat: now,
        exp: now + ttl_seconds,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to mint token")
}

/// A `Cookie` header carrying both session cookies.
pub fn session_cookies(access: &str, refresh: &str) -> String {
    format!("accessToken={access}; refreshToken={refresh}")
}

/// A `Cookie` header carrying only the access token.
pub fn access_cookie(access: &str) -> String {
    format!("accessToken={access}")
}

/// A user payload as the identity backend would return it.
pub fn user_json(id: &str, role: &str, username: &str) -> Value {
    json!({ "id": id, "role": role, "username": username })
}

/// State backing the mock upstream: registries the tests script and
/// counters they assert on.
#[derive(Default)]
pub struct UpstreamState {
    verify_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    data_calls: AtomicUsize,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    page_calls: AtomicUsize,
    /// Access token -> user payload for live sessions.
    sessions: Mutex<HashMap<String, Value>>,
    /// Refresh token -> user payload for refreshable credentials.
    refreshable: Mutex<HashMap<String, Value>>,
    /// Username -> (password, user payload) for login.
    credentials: Mutex<HashMap<String, (String, Value)>>,
    /// Forced statuses for upcoming /api hits, consumed front to back.
    api_script: Mutex<VecDeque<u16>>,
    /// Artificial latency inside the refresh handler.
    refresh_delay: Mutex<Duration>,
    token_seq: AtomicUsize,
}

impl UpstreamState {
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// Make the backend accept `token` as a live session for `user`.
    pub fn register_session(&self, token: &str, user: Value) {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), user);
    }

    /// Make the backend accept `refresh_token` for refreshes.
    pub fn register_refresh(&self, refresh_token: &str, user: Value) {
        self.refreshable
            .lock()
            .unwrap()
            .insert(refresh_token.to_string(), user);
    }

    /// Register login credentials.
    pub fn add_user(&self, username: &str, password: &str, user: Value) {
        self.credentials
            .lock()
            .unwrap()
            .insert(username.to_string(), (password.to_string(), user));
    }

    /// Force the next /api hit to answer with `status`, skipping the
    /// session check. Calls stack in order.
    pub fn script_api_status(&self, status: u16) {
        self.api_script.lock().unwrap().push_back(status);
    }

    /// Delay every refresh response, widening the single-flight window.
    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    /// Mint a token pair for `user` and register both halves.
    fn issue_pair(&self, user: &Value) -> (String, String) {
        let n = self.token_seq.fetch_add(1, Ordering::SeqCst);
        let sub = user.get("id").and_then(|v| v.as_str()).unwrap_or("u-mock");
        let role = user
            .get("role")
            .and_then(|v| v.as_str())
            .unwrap_or("employee")
            .parse::<Role>()
            .unwrap_or(Role::Employee);

        let access = mint_token(sub, role, 900);
        let refresh = format!("minted-refresh-{n}");

        self.sessions
            .lock()
            .unwrap()
            .insert(access.clone(), user.clone());
        self.refreshable
            .lock()
            .unwrap()
            .insert(refresh.clone(), user.clone());

        (access, refresh)
    }
}

/// Serve the mock upstream on an OS-assigned port and return its address.
async fn spawn_upstream(state: Arc<UpstreamState>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let addr = listener.local_addr().expect("No local addr");

    let router = Router::new()
        .route("/auth/verify", get(upstream_verify))
        .route("/auth/refresh", post(upstream_refresh))
        .route("/auth/login", post(upstream_login))
        .route("/auth/logout", post(upstream_logout))
        .route("/api", any(upstream_api))
        .route("/api/{*path}", any(upstream_api))
        .fallback(upstream_page)
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Mock upstream failed");
    });

    addr
}

async fn upstream_verify(State(up): State<Arc<UpstreamState>>, headers: HeaderMap) -> Response {
    up.verify_calls.fetch_add(1, Ordering::SeqCst);

    let user = bearer_token(&headers).and_then(|token| {
        let sessions = up.sessions.lock().unwrap();
        sessions.get(&token).cloned()
    });

    match user {
        Some(user) => Json(user).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn upstream_refresh(State(up): State<Arc<UpstreamState>>, Json(body): Json<Value>) -> Response {
    up.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *up.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let presented = body
        .get("refresh_token")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let user = {
        let refreshable = up.refreshable.lock().unwrap();
        refreshable.get(presented).cloned()
    };

    match user {
        Some(user) => {
            let (access, refresh) = up.issue_pair(&user);
            Json(json!({ "access_token": access, "refresh_token": refresh })).into_response()
        }
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn upstream_login(State(up): State<Arc<UpstreamState>>, Json(body): Json<Value>) -> Response {
    up.login_calls.fetch_add(1, Ordering::SeqCst);

    let username = body
        .get("username")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let password = body
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let user = {
        let credentials = up.credentials.lock().unwrap();
        match credentials.get(username) {
            Some((expected, user)) if expected == password => user.clone(),
            _ => return StatusCode::UNAUTHORIZED.into_response(),
        }
    };

    let (access, refresh) = up.issue_pair(&user);
    Json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "user": user,
    }))
    .into_response()
}

async fn upstream_logout(State(up): State<Arc<UpstreamState>>) -> StatusCode {
    up.logout_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

async fn upstream_api(State(up): State<Arc<UpstreamState>>, request: Request) -> Response {
    up.data_calls.fetch_add(1, Ordering::SeqCst);

    if let Some(forced) = up.api_script.lock().unwrap().pop_front() {
        return StatusCode::from_u16(forced)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response();
    }

    let known = bearer_token(request.headers())
        .map(|token| up.sessions.lock().unwrap().contains_key(&token))
        .unwrap_or(false);
    if !known {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let path = request.uri().path().to_string();
    let body_bytes = axum::body::to_bytes(request.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default();
    let echo: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    Json(json!({ "ok": true, "path": path, "echo": echo })).into_response()
}

async fn upstream_page(State(up): State<Arc<UpstreamState>>, request: Request) -> Html<String> {
    up.page_calls.fetch_add(1, Ordering::SeqCst);
    Html(format!("<html><body>page:{}</body></html>", request.uri()))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(ToString::to_string)
}
