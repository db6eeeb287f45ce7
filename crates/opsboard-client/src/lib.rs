//! # opsboard-client
//!
//! HTTP clients for the Opsboard gateway's upstreams.
//!
//! ## Modules
//!
//! - `backend`: identity backend client (verify, refresh, login, relay)
//! - `frontend`: frontend origin client for gated page fetches
//! - `refresh`: single-flight refresh deduplication
//! - `tokens`: the token pair wire contract

pub mod backend;
pub mod frontend;
pub mod refresh;
pub mod tokens;

pub use backend::{BackendClient, ForwardRequest, LoginOutcome, VerifiedUser};
pub use frontend::FrontendClient;
pub use refresh::{RefreshBackend, RefreshGate};
pub use tokens::TokenPair;
