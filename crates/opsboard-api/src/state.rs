//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use opsboard_auth::policy::RoutePolicy;
use opsboard_auth::verifier::TokenVerifier;
use opsboard_client::backend::BackendClient;
use opsboard_client::frontend::FrontendClient;
use opsboard_client::refresh::RefreshGate;
use opsboard_core::config::AppConfig;

use crate::cookies::TokenCookies;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All components are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Local access token verifier
    pub verifier: Arc<TokenVerifier>,
    /// Role-to-route access policy
    pub policy: Arc<RoutePolicy>,
    /// Identity backend client
    pub backend: Arc<BackendClient>,
    /// Frontend origin client
    pub frontend: Arc<FrontendClient>,
    /// Single-flight refresh gate
    pub refresh_gate: Arc<RefreshGate>,
    /// Session cookie reader/writer
    pub cookies: TokenCookies,
}
