//! Application wiring: builds the shared state from configuration.

use std::sync::Arc;

use opsboard_auth::policy::RoutePolicy;
use opsboard_auth::verifier::TokenVerifier;
use opsboard_client::backend::BackendClient;
use opsboard_client::frontend::FrontendClient;
use opsboard_client::refresh::{RefreshBackend, RefreshGate};
use opsboard_core::config::AppConfig;
use opsboard_core::result::AppResult;

use crate::cookies::TokenCookies;
use crate::state::AppState;

/// Construct every shared component from configuration.
///
/// Fails fast on configuration mistakes (bad policy table, unusable
/// client settings) so a misconfigured gateway never starts serving.
pub fn build_state(config: AppConfig) -> AppResult<AppState> {
    let policy = RoutePolicy::from_config(&config.policy)?;
    let verifier = TokenVerifier::new(&config.auth);
    let backend = Arc::new(BackendClient::new(&config.backend)?);
    let frontend = FrontendClient::new(&config.frontend)?;
    let cookies = TokenCookies::new(&config.auth.cookie);

    let refresh_backend: Arc<dyn RefreshBackend> = backend.clone();
    let refresh_gate = RefreshGate::new(refresh_backend);

    Ok(AppState {
        config: Arc::new(config),
        verifier: Arc::new(verifier),
        policy: Arc::new(policy),
        backend,
        frontend: Arc::new(frontend),
        refresh_gate: Arc::new(refresh_gate),
        cookies,
    })
}
