//! Role-to-route access policy.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;

use opsboard_core::config::policy::PolicyConfig;
use opsboard_core::{AppError, AppResult};

use crate::role::Role;

/// The static route access policy, built once at startup and never mutated.
///
/// A path is allowed for a role iff it starts with at least one prefix in
/// that role's allow-set. Allow-sets are plain sets, not ordered rules:
/// there is no denylist and no first-match priority. A role with no entry
/// in the table is denied everywhere.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    allow: HashMap<Role, Vec<String>>,
    public_paths: Vec<String>,
    login_path: String,
    unauthorized_path: String,
    default_landing: String,
}

impl RoutePolicy {
    /// Builds the policy from its configuration form.
    ///
    /// Fails on unknown role names and on present-but-empty allow-sets;
    /// both are configuration mistakes that would otherwise turn into
    /// silent denials. Roles missing from the table entirely are legal
    /// (deny-all) but logged, as is a role that cannot reach the default
    /// landing page, since bouncing such a user off `/login` would send
    /// them straight to `/unauthorized`.
    pub fn from_config(config: &PolicyConfig) -> AppResult<Self> {
        let mut allow = HashMap::new();
        for (name, prefixes) in &config.allow {
            let role = Role::from_str(name).map_err(|_| {
                AppError::configuration(format!("Unknown role '{name}' in route policy"))
            })?;
            if prefixes.is_empty() {
                return Err(AppError::configuration(format!(
                    "Role '{role}' has an empty allow-set"
                )));
            }
            for prefix in prefixes {
                if !prefix.starts_with('/') {
                    return Err(AppError::configuration(format!(
                        "Route prefix '{prefix}' for role '{role}' must start with '/'"
                    )));
                }
            }
            allow.insert(role, prefixes.clone());
        }

        let policy = Self {
            allow,
            public_paths: config.public_paths.clone(),
            login_path: config.login_path.clone(),
            unauthorized_path: config.unauthorized_path.clone(),
            default_landing: config.default_landing.clone(),
        };

        for role in Role::ALL {
            if !policy.allow.contains_key(&role) {
                warn!(role = %role, "role has no allow-set; all routes are denied for it");
            } else if !policy.is_allowed(role, &policy.default_landing) {
                warn!(
                    role = %role,
                    landing = %policy.default_landing,
                    "role cannot reach the default landing page"
                );
            }
        }

        Ok(policy)
    }

    /// Whether `role` may navigate to `path`.
    pub fn is_allowed(&self, role: Role, path: &str) -> bool {
        self.allow
            .get(&role)
            .is_some_and(|prefixes| prefixes.iter().any(|prefix| path.starts_with(prefix)))
    }

    /// All roles allowed to navigate to `path`.
    pub fn roles_for(&self, path: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.is_allowed(*role, path))
            .collect()
    }

    /// Errors unless `role` is one of `roles`.
    pub fn require_role(&self, role: Role, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&role) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{role}' is not permitted here"
            )))
        }
    }

    /// Whether `path` is reachable without a session.
    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }

    /// Whether `path` is the unauthorized page, which always passes the
    /// gate so a denial redirect cannot loop on itself.
    pub fn is_unauthorized_page(&self, path: &str) -> bool {
        path.starts_with(&self.unauthorized_path)
    }

    /// Redirect target for unauthenticated requests.
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Redirect target for authenticated but denied requests.
    pub fn unauthorized_path(&self) -> &str {
        &self.unauthorized_path
    }

    /// Landing page for authenticated users bounced off public paths.
    pub fn default_landing(&self) -> &str {
        &self.default_landing
    }
}
