//! HTTP client for the frontend origin.

use std::time::Duration;

use opsboard_core::config::upstream::FrontendConfig;
use opsboard_core::{AppError, AppResult, ErrorKind};

/// Fetches rendered pages from the frontend origin.
///
/// Page fetches happen only after the route gate and session verification
/// have passed; no credentials are attached to the upstream request.
#[derive(Debug, Clone)]
pub struct FrontendClient {
    http: reqwest::Client,
    base_url: String,
}

impl FrontendClient {
    /// Create a new client from frontend configuration.
    pub fn new(config: &FrontendConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build frontend HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the page at `path_and_query` from the frontend origin.
    pub async fn fetch_page(
        &self,
        path_and_query: &str,
        accept: Option<&str>,
    ) -> AppResult<reqwest::Response> {
        let mut builder = self
            .http
            .get(format!("{}{}", self.base_url, path_and_query));
        if let Some(accept) = accept {
            builder = builder.header(reqwest::header::ACCEPT, accept);
        }

        builder.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BackendUnreachable,
                "Frontend origin is unreachable",
                e,
            )
        })
    }
}
