//! Local access token verification.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;

use opsboard_core::AppError;
use opsboard_core::config::auth::AuthConfig;

use crate::claims::Claims;

/// Why a token failed local verification.
///
/// Any failure that is neither an expiry nor a bad signature collapses into
/// `Malformed`: bad structure, bad base64, claims that do not deserialize,
/// and roles outside the closed set all deny the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// The token is not a structurally valid JWT or its claims do not parse.
    #[error("token is malformed")]
    Malformed,
    /// The signature does not match the shared secret.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The token is past its expiration.
    #[error("token has expired")]
    Expired,
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        AppError::authentication(err.to_string())
    }
}

/// Verifies access tokens against the shared HS256 secret.
///
/// This is the fast, local tier of the trust model: no network, no
/// revocation lookups. The authoritative check happens against the
/// identity backend.
#[derive(Clone)]
pub struct TokenVerifier {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Creates a new verifier from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => VerifyError::Expired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        VerifyError::InvalidSignature
                    }
                    _ => VerifyError::Malformed,
                }
            })?;

        Ok(token_data.claims)
    }
}
