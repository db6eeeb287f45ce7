//! Single-flight token refresh.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

use opsboard_core::AppResult;

use crate::backend::BackendClient;
use crate::tokens::TokenPair;

/// The refresh capability of the identity backend.
///
/// Split out as a trait so the gate can be exercised against a counting
/// fake in tests.
#[async_trait]
pub trait RefreshBackend: Send + Sync {
    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;
}

#[async_trait]
impl RefreshBackend for BackendClient {
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        BackendClient::refresh(self, refresh_token).await
    }
}

type SharedRefresh = Shared<BoxFuture<'static, AppResult<TokenPair>>>;

/// Deduplicates concurrent refreshes of the same credential.
///
/// The first caller for a given refresh token starts the backend exchange;
/// every concurrent caller with the same token awaits that same in-flight
/// call and receives a clone of its result, success or failure. Distinct
/// credentials refresh independently: the gateway serves many users and
/// one user's refresh must not serialize another's.
pub struct RefreshGate {
    backend: Arc<dyn RefreshBackend>,
    inflight: DashMap<String, SharedRefresh>,
}

impl std::fmt::Debug for RefreshGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshGate")
            .field("inflight", &self.inflight.len())
            .finish()
    }
}

impl RefreshGate {
    /// Create a gate over the given backend.
    pub fn new(backend: Arc<dyn RefreshBackend>) -> Self {
        Self {
            backend,
            inflight: DashMap::new(),
        }
    }

    /// Refresh `refresh_token`, joining an in-flight exchange if one exists.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        // The entry guard must not be held across an await; both arms
        // return owned values so the shard lock drops with the match.
        let (flight, is_owner) = match self.inflight.entry(refresh_token.to_string()) {
            Entry::Occupied(entry) => {
                debug!("joining in-flight token refresh");
                (entry.get().clone(), false)
            }
            Entry::Vacant(entry) => {
                let backend = Arc::clone(&self.backend);
                let token = refresh_token.to_string();
                let flight = async move { backend.refresh(&token).await }
                    .boxed()
                    .shared();
                entry.insert(flight.clone());
                (flight, true)
            }
        };

        let result = flight.await;

        if is_owner {
            self.inflight.remove(refresh_token);
        }

        result
    }
}
