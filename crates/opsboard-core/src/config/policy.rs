//! Role-to-route access policy configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The route access policy in its raw configuration form.
///
/// `allow` maps role names to the route prefixes that role may navigate to.
/// Role names are validated against the closed role set when the policy is
/// built; a typo here is a startup error, not a silent deny.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Role name to allowed route prefixes.
    #[serde(default = "default_allow")]
    pub allow: HashMap<String, Vec<String>>,
    /// Route prefixes reachable without a session (login, signup).
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
    /// Redirect target for unauthenticated requests.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Redirect target for authenticated but denied requests.
    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,
    /// Landing page for authenticated users bounced off public paths.
    #[serde(default = "default_landing")]
    pub default_landing: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow: default_allow(),
            public_paths: default_public_paths(),
            login_path: default_login_path(),
            unauthorized_path: default_unauthorized_path(),
            default_landing: default_landing(),
        }
    }
}

fn default_allow() -> HashMap<String, Vec<String>> {
    let mut allow = HashMap::new();
    allow.insert(
        "admin".to_string(),
        vec![
            "/admin".to_string(),
            "/dashboard".to_string(),
            "/settings".to_string(),
        ],
    );
    allow.insert(
        "core".to_string(),
        vec![
            "/dashboard".to_string(),
            "/projects".to_string(),
            "/teams".to_string(),
        ],
    );
    allow.insert(
        "employee".to_string(),
        vec!["/dashboard".to_string(), "/tasks".to_string()],
    );
    allow
}

fn default_public_paths() -> Vec<String> {
    vec!["/login".to_string(), "/signup".to_string()]
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_unauthorized_path() -> String {
    "/unauthorized".to_string()
}

fn default_landing() -> String {
    "/dashboard".to_string()
}
