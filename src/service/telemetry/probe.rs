//! Lightweight timing probe used when the performance provider is unavailable.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::LatencyProbe;
use crate::error::{AppError, Result};

const SERVICE: &str = "probe";

/// Times a single HEAD request end to end.
///
/// Any response counts except a 5xx, which says nothing useful about how
/// fast the page itself is served.
pub struct HeadProbe {
    client: Client,
}

impl HeadProbe {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LatencyProbe for HeadProbe {
    async fn measure(&self, url: &str) -> Result<Duration> {
        let start = Instant::now();
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| AppError::service(SERVICE, format!("HEAD {url} failed: {e}")))?;
        let elapsed = start.elapsed();

        let status = response.status();
        if status.is_server_error() {
            return Err(AppError::service(SERVICE, format!("HEAD {url} returned {status}")));
        }

        tracing::debug!("[TELEMETRY] Probe round trip for {}: {:?} ({})", url, elapsed, status);
        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::http::{create_client, ClientType};

    fn probe() -> HeadProbe {
        HeadProbe::new(create_client(ClientType::Browser, "probe-test", Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn measures_a_successful_head() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("HEAD", "/").with_status(200).create_async().await;

        let latency = probe().measure(&format!("{}/", server.url())).await.unwrap();
        assert!(latency < Duration::from_secs(5));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn method_not_allowed_still_measures() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("HEAD", "/").with_status(405).create_async().await;
        assert!(probe().measure(&format!("{}/", server.url())).await.is_ok());
    }

    #[tokio::test]
    async fn server_errors_fail_the_probe() {
        let mut server = mockito::Server::new_async().await;
        let _m = server.mock("HEAD", "/").with_status(503).create_async().await;
        assert!(probe().measure(&format!("{}/", server.url())).await.is_err());
    }
}
