//! Token verification and cookie configuration.

use serde::{Deserialize, Serialize};

/// Authentication configuration.
///
/// The gateway never mints tokens; the secret is used only to verify the
/// HS256 signature on access tokens issued by the identity backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for access token verification (HMAC-SHA256).
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    /// Clock skew tolerated when checking token expiry, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Session cookie settings.
    #[serde(default)]
    pub cookie: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            leeway_seconds: default_leeway(),
            cookie: CookieConfig::default(),
        }
    }
}

/// Names and attributes of the session token cookies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie holding the access token.
    #[serde(default = "default_access_name")]
    pub access_name: String,
    /// Cookie holding the refresh token.
    #[serde(default = "default_refresh_name")]
    pub refresh_name: String,
    /// Whether cookies are marked Secure (HTTPS only).
    #[serde(default)]
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            access_name: default_access_name(),
            refresh_name: default_refresh_name(),
            secure: false,
        }
    }
}

fn default_token_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    5
}

fn default_access_name() -> String {
    "accessToken".to_string()
}

fn default_refresh_name() -> String {
    "refreshToken".to_string()
}
