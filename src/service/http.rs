use anyhow::Context;
use reqwest::Client;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    /// Fetches pages the way a desktop browser would
    Browser,
    /// Talks JSON to provider APIs
    Api,
}

/// Factory for creating an HTTP client for a given kind of peer.
pub fn create_client(client_type: ClientType, user_agent: &str, timeout: Duration) -> Result<Client> {
    let builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)));

    let client = match client_type {
        ClientType::Browser => builder
            .user_agent(user_agent)
            .default_headers(browser_headers())
            .build()
            .context("Failed to build browser HTTP client")?,
        ClientType::Api => builder
            .user_agent(concat!("site-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build API HTTP client")?,
    };
    Ok(client)
}

fn browser_headers() -> reqwest::header::HeaderMap {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}
