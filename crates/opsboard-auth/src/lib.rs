//! # opsboard-auth
//!
//! Local token verification and role-based route policy for the Opsboard
//! gateway.
//!
//! ## Modules
//!
//! - `role`: the closed role set
//! - `claims`: access token claims payload
//! - `verifier`: HS256 verification against the shared secret
//! - `policy`: role-to-route-prefix allow table and redirect targets

pub mod claims;
pub mod policy;
pub mod role;
pub mod verifier;

pub use claims::Claims;
pub use policy::RoutePolicy;
pub use role::Role;
pub use verifier::{TokenVerifier, VerifyError};
