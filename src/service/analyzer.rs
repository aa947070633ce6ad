//! Analysis orchestration.
//!
//! `analyze` runs one page through the pipeline:
//! fetch → extract → classify → score (telemetry overlapping) → assemble →
//! advisory ∥ keywords → result.
//!
//! Only URL validation and the page fetch can fail the call. Every later
//! stage degrades locally and logs the degradation.

use std::sync::Arc;

use reqwest::Client;
use tokio::task::JoinError;
use url::Url;

use crate::config::EngineConfig;
use crate::domain::models::{overall_score, AnalysisResult};
use crate::error::{AppError, Result};
use crate::extractor::PageExtractor;
use crate::service::advisor::{AdvisoryInput, AdvisorySynthesizer};
use crate::service::classifier::classify;
use crate::service::gemini::{GeminiClient, GenerativeProvider};
use crate::service::http::{create_client, ClientType};
use crate::service::keywords::KeywordSuggester;
use crate::service::scoring::score_structure;
use crate::service::telemetry::{telemetry_categories, PerformanceAdapter};

/// Entry point of the engine.
///
/// Holds only immutable configuration and shared providers, so one instance
/// can serve any number of concurrent `analyze` calls.
pub struct SiteAnalyzer {
    client: Client,
    performance: PerformanceAdapter,
    advisor: Arc<AdvisorySynthesizer>,
    keywords: Arc<KeywordSuggester>,
}

impl SiteAnalyzer {
    /// Wire the production providers from configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let generative: Option<Arc<dyn GenerativeProvider>> = match GeminiClient::from_config(config)? {
            Some(client) => Some(Arc::new(client)),
            None => {
                tracing::info!("[ANALYZE] No GEMINI_API_KEY set; advice and keywords will use templates");
                None
            }
        };
        Self::with_parts(config, PerformanceAdapter::from_config(config)?, generative)
    }

    /// Assemble an analyzer from explicit providers.
    pub fn with_parts(
        config: &EngineConfig,
        performance: PerformanceAdapter,
        generative: Option<Arc<dyn GenerativeProvider>>,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Browser, &config.user_agent, config.fetch_timeout)?,
            performance,
            advisor: Arc::new(AdvisorySynthesizer::new(
                generative.clone(),
                config.generative_timeout,
                config.persona.clone(),
            )),
            keywords: Arc::new(KeywordSuggester::new(generative, config.generative_timeout)),
        })
    }

    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult> {
        let url = validate_url(url)?;
        tracing::info!("[ANALYZE] Starting analysis: {}", url);

        let html = self.fetch(&url).await?;
        let page = PageExtractor::extract(&html, url.as_str());
        let (business_type, site_type) = classify(&page);

        // telemetry goes first so its request is in flight while the scorers run
        let (telemetry, mut categories) = tokio::join!(
            self.performance.collect(url.as_str(), page.has_mobile_viewport()),
            async { score_structure(&page) }
        );
        categories.extend(telemetry_categories(&telemetry));
        let overall = overall_score(&categories);

        let advisor = Arc::clone(&self.advisor);
        let input = AdvisoryInput::new(&page, categories.clone(), overall, business_type, site_type);
        let advice_task = tokio::spawn(async move { advisor.synthesize(&input).await });

        let keywords = Arc::clone(&self.keywords);
        let keyword_task = tokio::spawn(async move { keywords.suggest(&page, business_type).await });

        let (advice, keyword_suggestions) = tokio::join!(advice_task, keyword_task);

        let result = AnalysisResult {
            url: url.to_string(),
            overall_score: overall,
            categories,
            ai_advice: settle("advisory", advice),
            keyword_suggestions: settle("keywords", keyword_suggestions),
            site_type,
            business_type,
            telemetry_source: telemetry.analysis_type,
        };

        tracing::info!(
            "[ANALYZE] Completed {}: overall {} ({} categories, telemetry {})",
            result.url,
            result.overall_score,
            result.categories.len(),
            result.telemetry_source.as_str()
        );
        Ok(result)
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        tracing::debug!("[FETCH] GET {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| AppError::fetch(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("[FETCH] {} answered {}", url, status);
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AppError::fetch(url.as_str(), format!("failed to read body: {e}")))
    }
}

/// Parse and accept only absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| AppError::InvalidUrl(format!("{trimmed}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!("{trimmed}: only http and https are supported")));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(AppError::InvalidUrl(format!("{trimmed}: missing host")));
    }
    Ok(url)
}

/// Keep a task's value; a panicked or cancelled task is logged and dropped.
fn settle<T>(stage: &str, outcome: std::result::Result<T, JoinError>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[ANALYZE] {} task failed: {} - omitting it from the result", stage, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert_eq!(validate_url(" https://example.com ").unwrap().as_str(), "https://example.com/");
        assert!(validate_url("http://localhost:8080/menu?x=1").is_ok());
    }

    #[test]
    fn rejects_other_inputs() {
        for bad in ["", "example.com", "ftp://example.com/file", "mailto:chef@example.com", "https://"] {
            let err = validate_url(bad).unwrap_err();
            assert!(matches!(err, AppError::InvalidUrl(_)), "{bad}: {err}");
        }
    }

    #[tokio::test]
    async fn settle_drops_panicked_tasks() {
        let panicked = tokio::spawn(async { None::<u8>.expect("boom") }).await;
        assert_eq!(settle("test", panicked), None);

        let finished = tokio::spawn(async { 7u8 }).await;
        assert_eq!(settle("test", finished), Some(7));
    }

    #[test]
    fn analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SiteAnalyzer>();
    }
}
