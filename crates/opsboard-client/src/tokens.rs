//! Token pair contract with the identity backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The access/refresh token pair returned by login and refresh calls.
///
/// A refresh replaces the pair wholesale; the gateway never mixes an old
/// refresh token with a new access token. Expiry timestamps are advisory
/// for the client UI; expiry is enforced by token verification, not by
/// cookie lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token for API requests.
    pub access_token: String,
    /// Long-lived credential for obtaining new pairs.
    pub refresh_token: String,
    /// When the access token expires, if the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_expires_at: Option<DateTime<Utc>>,
    /// When the refresh token expires, if the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiries_are_optional() {
        let pair: TokenPair = serde_json::from_str(
            r#"{"access_token": "a", "refresh_token": "r"}"#,
        )
        .unwrap();
        assert_eq!(pair.access_token, "a");
        assert!(pair.access_expires_at.is_none());
    }
}
