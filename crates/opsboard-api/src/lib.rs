//! # opsboard-api
//!
//! HTTP surface of the Opsboard gateway, built on Axum.
//!
//! Provides the route gate middleware, authoritative session
//! verification, cookie handling, the auth/relay/health handlers, DTOs,
//! and error mapping.

pub mod app;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod session;
pub mod state;

pub use app::build_state;
pub use router::build_router;
pub use state::AppState;
