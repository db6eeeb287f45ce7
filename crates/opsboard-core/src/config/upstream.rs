//! Upstream origin configuration: the identity backend and the frontend.

use serde::{Deserialize, Serialize};

/// Identity backend configuration.
///
/// The backend is the authority on sessions: it issues, verifies, and
/// refreshes tokens. The gateway only relays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the identity backend, without a trailing slash.
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Timeout for session verification calls, in seconds.
    ///
    /// Kept short: a page navigation blocks on this call, and an
    /// unreachable backend must fail closed quickly.
    #[serde(default = "default_verify_timeout")]
    pub verify_timeout_seconds: u64,
    /// Timeout for relayed API calls, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            verify_timeout_seconds: default_verify_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Frontend origin configuration.
///
/// Gated page navigations that pass the route gate are fetched from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Base URL of the frontend origin, without a trailing slash.
    #[serde(default = "default_frontend_url")]
    pub base_url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: default_frontend_url(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:4000".to_string()
}

fn default_verify_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_frontend_url() -> String {
    "http://127.0.0.1:3000".to_string()
}
