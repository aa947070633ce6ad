//! Performance telemetry with tiered degradation.
//!
//! Three tiers, each attempted once:
//! - **Full**: a [`PerformanceProvider`] (PageSpeed Insights) returns lab scores
//!   and, for pages with enough traffic, real-user field data
//! - **Probe**: a single timed HEAD request mapped to a speed score
//! - **Heuristic**: fixed scores keyed on the mobile viewport declaration
//!
//! [`PerformanceAdapter::collect`] never fails; the last tier always answers.

mod pagespeed;
mod probe;
mod types;

pub use pagespeed::{parse_report, PageSpeedClient};
pub use probe::HeadProbe;
pub use types::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::domain::models::{SeoCategory, Suggestion};
use crate::error::{with_timeout, Result};
use crate::service::http::{create_client, ClientType};
use crate::service::scoring::category;

pub const SPEED_ID: &str = "speed";
pub const MOBILE_ID: &str = "mobile";

/// Heuristic-tier score when a mobile viewport is declared.
pub const HEURISTIC_WITH_VIEWPORT: u8 = 70;
/// Heuristic-tier score without a mobile viewport.
pub const HEURISTIC_WITHOUT_VIEWPORT: u8 = 50;

/// Mobile score ceiling when the viewport check fails.
const MOBILE_CAP_WITHOUT_VIEWPORT: u8 = 50;
const MAX_SPEED_SUGGESTIONS: usize = 5;

/// External source of lab (and optionally field) performance data.
#[async_trait]
pub trait PerformanceProvider: Send + Sync {
    /// Run a mobile performance report for `url`.
    async fn run(&self, url: &str) -> Result<ProviderReport>;

    /// Human-readable name for this provider.
    fn name(&self) -> &'static str;
}

/// Measures the round-trip latency of one lightweight request.
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    async fn measure(&self, url: &str) -> Result<Duration>;
}

pub struct PerformanceAdapter {
    provider: Option<Arc<dyn PerformanceProvider>>,
    probe: Arc<dyn LatencyProbe>,
    provider_timeout: Duration,
    probe_timeout: Duration,
}

impl PerformanceAdapter {
    pub fn new(
        provider: Option<Arc<dyn PerformanceProvider>>,
        probe: Arc<dyn LatencyProbe>,
        provider_timeout: Duration,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            probe,
            provider_timeout,
            probe_timeout,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let provider: Option<Arc<dyn PerformanceProvider>> = if config.pagespeed_enabled {
            Some(Arc::new(PageSpeedClient::new(config)?))
        } else {
            tracing::info!("[TELEMETRY] PageSpeed disabled; using probe and heuristic tiers only");
            None
        };
        let probe_client = create_client(ClientType::Browser, &config.user_agent, config.probe_timeout)?;

        Ok(Self::new(
            provider,
            Arc::new(HeadProbe::new(probe_client)),
            config.telemetry_timeout,
            config.probe_timeout,
        ))
    }

    /// Walk the cascade until a tier answers.
    pub async fn collect(&self, url: &str, has_viewport: bool) -> PerformanceTelemetry {
        if let Some(provider) = &self.provider {
            match with_timeout("pagespeed", self.provider_timeout, provider.run(url)).await {
                Ok(report) => {
                    tracing::info!(
                        "[TELEMETRY] {} report for {} (performance {}, field data: {})",
                        provider.name(),
                        url,
                        report.lab_data.performance.score,
                        report.field_data.is_some()
                    );
                    return full_telemetry(report, has_viewport);
                }
                Err(e) => {
                    tracing::warn!("[TELEMETRY] {} failed for {}: {} - falling back to probe", provider.name(), url, e);
                }
            }
        }

        match with_timeout("probe", self.probe_timeout, self.probe.measure(url)).await {
            Ok(latency) => return probe_telemetry(latency, has_viewport),
            Err(e) => {
                tracing::warn!("[TELEMETRY] Probe failed for {}: {} - using heuristic values", url, e);
            }
        }

        heuristic_telemetry(has_viewport)
    }
}

/// Tier 1 payload from a provider report.
pub fn full_telemetry(report: ProviderReport, has_viewport: bool) -> PerformanceTelemetry {
    let mut improvements = report.opportunities;
    if improvements.is_empty() {
        improvements.push("Keep monitoring Core Web Vitals after each release to catch regressions early.".to_string());
    }

    let has_field_data = report.field_data.is_some();
    PerformanceTelemetry {
        lab_data: report.lab_data,
        field_data: report.field_data,
        analysis_type: AnalysisType::Full,
        has_field_data,
        improvements,
        viewport_passed: report.viewport_passed.unwrap_or(has_viewport),
        probe_latency_ms: None,
    }
}

/// Latency bands: <1s 95, <2s 85, <3s 75, <5s 65, otherwise 50.
pub fn latency_score(latency: Duration) -> u8 {
    match latency.as_millis() {
        0..=999 => 95,
        1_000..=1_999 => 85,
        2_000..=2_999 => 75,
        3_000..=4_999 => 65,
        _ => 50,
    }
}

/// Tier 2 payload from a measured round trip.
pub fn probe_telemetry(latency: Duration, has_viewport: bool) -> PerformanceTelemetry {
    let score = latency_score(latency);
    let mut lab_data = LabData::uniform(heuristic_score(has_viewport));
    lab_data.performance = LabCategory::new(score);

    let mut improvements = Vec::new();
    if latency >= Duration::from_secs(2) {
        improvements.push(format!(
            "The server took {} ms to answer; reduce server response time with caching or a CDN.",
            latency.as_millis()
        ));
    }
    improvements.extend(generic_improvements(has_viewport));

    PerformanceTelemetry {
        lab_data,
        field_data: None,
        analysis_type: AnalysisType::Probe,
        has_field_data: false,
        improvements,
        viewport_passed: has_viewport,
        probe_latency_ms: Some(latency.as_millis() as u64),
    }
}

/// Tier 3 payload: fixed scores, no network.
pub fn heuristic_telemetry(has_viewport: bool) -> PerformanceTelemetry {
    PerformanceTelemetry {
        lab_data: LabData::uniform(heuristic_score(has_viewport)),
        field_data: None,
        analysis_type: AnalysisType::Heuristic,
        has_field_data: false,
        improvements: generic_improvements(has_viewport),
        viewport_passed: has_viewport,
        probe_latency_ms: None,
    }
}

fn heuristic_score(has_viewport: bool) -> u8 {
    if has_viewport {
        HEURISTIC_WITH_VIEWPORT
    } else {
        HEURISTIC_WITHOUT_VIEWPORT
    }
}

fn generic_improvements(has_viewport: bool) -> Vec<String> {
    let mut improvements = vec![
        "Compress and resize images, and serve them in WebP or AVIF.".to_string(),
        "Enable browser caching and text compression (gzip or brotli).".to_string(),
        "Minify CSS and JavaScript and defer scripts that are not needed for first paint.".to_string(),
    ];
    if !has_viewport {
        improvements.push("Add a responsive viewport meta tag so mobile browsers render the page at device width.".to_string());
    }
    improvements
}

/// The speed and mobile categories derived from a telemetry payload.
pub fn telemetry_categories(telemetry: &PerformanceTelemetry) -> Vec<SeoCategory> {
    vec![speed_category(telemetry), mobile_category(telemetry)]
}

/// Field data, when it carries an overall category, overrides the lab score.
pub fn speed_category(telemetry: &PerformanceTelemetry) -> SeoCategory {
    let lab_score = telemetry.lab_data.performance.score;
    let overall = telemetry
        .field_data
        .as_ref()
        .and_then(|f| f.overall_category);

    let mut suggestions = Vec::new();
    let (score, description) = match (telemetry.analysis_type, overall) {
        (AnalysisType::Full, Some(field)) => {
            suggestions.push(Suggestion::key(
                "telemetry.fieldData",
                [("category", field.as_str().to_string()), ("labScore", lab_score.to_string())],
            ));
            (
                field.speed_score(),
                format!(
                    "Real-user data rates this page {} (single lab run scored {lab_score}).",
                    field.as_str()
                ),
            )
        }
        (AnalysisType::Full, None) => {
            suggestions.push(Suggestion::key("telemetry.labData", [("score", lab_score.to_string())]));
            (lab_score, format!("Lab performance score is {lab_score}/100 on a simulated mobile device."))
        }
        (AnalysisType::Probe, _) => {
            let latency = telemetry.probe_latency_ms.unwrap_or_default();
            suggestions.push(Suggestion::key("telemetry.probe", [("latencyMs", latency.to_string())]));
            (lab_score, format!("Estimated from a {latency} ms server round trip."))
        }
        (AnalysisType::Heuristic, _) => {
            suggestions.push(Suggestion::key("telemetry.heuristic", std::iter::empty::<(String, String)>()));
            (lab_score, "Performance could not be measured; this is an estimate.".to_string())
        }
    };

    suggestions.extend(
        telemetry
            .improvements
            .iter()
            .take(MAX_SPEED_SUGGESTIONS)
            .map(Suggestion::literal),
    );

    category(SPEED_ID, "Page Speed", score, description, suggestions)
}

/// Derived from the lab accessibility score and the viewport check only.
pub fn mobile_category(telemetry: &PerformanceTelemetry) -> SeoCategory {
    let accessibility = &telemetry.lab_data.accessibility;
    let score = if telemetry.viewport_passed {
        accessibility.score
    } else {
        accessibility.score.min(MOBILE_CAP_WITHOUT_VIEWPORT)
    };

    let mut suggestions = Vec::new();
    if !telemetry.viewport_passed {
        suggestions.push(Suggestion::literal(
            "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"> to the page head.",
        ));
    }
    suggestions.extend(accessibility.issues.iter().take(3).map(Suggestion::literal));
    if suggestions.is_empty() {
        suggestions.push(Suggestion::literal("Check tap target sizes and font legibility on real devices."));
    }

    let description = if telemetry.viewport_passed {
        format!("Mobile viewport configured; accessibility score {}.", accessibility.score)
    } else {
        format!("No mobile viewport; accessibility score {}.", accessibility.score)
    };

    category(MOBILE_ID, "Mobile Friendliness", score, description, suggestions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CategoryStatus;
    use crate::test_utils::mocks::{
        FailingPerformanceProvider, FailingProbe, FixedProbe, StaticPerformanceProvider,
    };

    fn adapter(provider: Option<Arc<dyn PerformanceProvider>>, probe: Arc<dyn LatencyProbe>) -> PerformanceAdapter {
        PerformanceAdapter::new(provider, probe, Duration::from_secs(1), Duration::from_secs(1))
    }

    #[test]
    fn latency_bands() {
        assert_eq!(latency_score(Duration::from_millis(999)), 95);
        assert_eq!(latency_score(Duration::from_millis(1_000)), 85);
        assert_eq!(latency_score(Duration::from_millis(2_500)), 75);
        assert_eq!(latency_score(Duration::from_millis(4_999)), 65);
        assert_eq!(latency_score(Duration::from_secs(5)), 50);
        assert_eq!(latency_score(Duration::from_secs(60)), 50);
    }

    #[test]
    fn field_data_overrides_lab_score() {
        let report = StaticPerformanceProvider::report(40, Some(FieldCategory::Fast));
        let speed = speed_category(&full_telemetry(report, true));
        assert_eq!((speed.score, speed.status), (95, CategoryStatus::Good));
        assert!(matches!(
            &speed.suggestions[0],
            Suggestion::TranslationKey { key, .. } if key == "telemetry.fieldData"
        ));

        let report = StaticPerformanceProvider::report(98, Some(FieldCategory::Slow));
        let speed = speed_category(&full_telemetry(report, true));
        assert_eq!((speed.score, speed.status), (50, CategoryStatus::Danger));

        let report = StaticPerformanceProvider::report(98, Some(FieldCategory::Average));
        let speed = speed_category(&full_telemetry(report, true));
        assert_eq!((speed.score, speed.status), (75, CategoryStatus::Warning));
    }

    #[test]
    fn lab_score_used_without_field_data() {
        let report = StaticPerformanceProvider::report(40, None);
        let telemetry = full_telemetry(report, true);
        assert!(!telemetry.has_field_data);
        let speed = speed_category(&telemetry);
        assert_eq!((speed.score, speed.status), (40, CategoryStatus::Danger));
    }

    #[test]
    fn mobile_ignores_field_data_and_caps_without_viewport() {
        let mut report = StaticPerformanceProvider::report(40, Some(FieldCategory::Fast));
        report.lab_data.accessibility.score = 92;
        report.viewport_passed = Some(false);
        let mobile = mobile_category(&full_telemetry(report.clone(), true));
        assert_eq!(mobile.score, 50);

        report.viewport_passed = Some(true);
        let mobile = mobile_category(&full_telemetry(report, false));
        assert_eq!((mobile.score, mobile.status), (92, CategoryStatus::Good));
    }

    #[test]
    fn heuristic_tier_depends_on_viewport() {
        let speed = speed_category(&heuristic_telemetry(true));
        assert_eq!(speed.score, 70);
        let speed = speed_category(&heuristic_telemetry(false));
        assert_eq!(speed.score, 50);
        assert!(!heuristic_telemetry(false).improvements.is_empty());
    }

    #[tokio::test]
    async fn provider_success_is_full_tier() {
        let provider = StaticPerformanceProvider::new(StaticPerformanceProvider::report(81, None));
        let telemetry = adapter(Some(Arc::new(provider)), Arc::new(FailingProbe))
            .collect("https://example.com/", true)
            .await;
        assert_eq!(telemetry.analysis_type, AnalysisType::Full);
        assert_eq!(telemetry.lab_data.performance.score, 81);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_probe() {
        let telemetry = adapter(
            Some(Arc::new(FailingPerformanceProvider)),
            Arc::new(FixedProbe(Duration::from_millis(1_500))),
        )
        .collect("https://example.com/", true)
        .await;
        assert_eq!(telemetry.analysis_type, AnalysisType::Probe);
        assert_eq!(telemetry.lab_data.performance.score, 85);
        assert!(telemetry.field_data.is_none());
        assert_eq!(telemetry.probe_latency_ms, Some(1_500));
    }

    #[tokio::test]
    async fn missing_provider_goes_straight_to_probe() {
        let telemetry = adapter(None, Arc::new(FixedProbe(Duration::from_millis(200))))
            .collect("https://example.com/", false)
            .await;
        assert_eq!(telemetry.analysis_type, AnalysisType::Probe);
        assert_eq!(speed_category(&telemetry).score, 95);
        assert_eq!(mobile_category(&telemetry).score, 50);
    }

    #[tokio::test]
    async fn every_tier_failing_yields_heuristic() {
        for (viewport, expected) in [(true, 70), (false, 50)] {
            let telemetry = adapter(Some(Arc::new(FailingPerformanceProvider)), Arc::new(FailingProbe))
                .collect("https://example.com/", viewport)
                .await;
            assert_eq!(telemetry.analysis_type, AnalysisType::Heuristic);
            let speed = speed_category(&telemetry);
            assert_eq!(speed.score, expected);
            assert!(matches!(
                &speed.suggestions[0],
                Suggestion::TranslationKey { key, .. } if key == "telemetry.heuristic"
            ));
        }
    }

    #[tokio::test]
    async fn slow_provider_times_out_into_probe() {
        let provider = StaticPerformanceProvider::new(StaticPerformanceProvider::report(99, None))
            .with_delay(Duration::from_secs(30));
        let adapter = PerformanceAdapter::new(
            Some(Arc::new(provider)),
            Arc::new(FixedProbe(Duration::from_millis(100))),
            Duration::from_millis(50),
            Duration::from_secs(1),
        );
        let telemetry = adapter.collect("https://example.com/", true).await;
        assert_eq!(telemetry.analysis_type, AnalysisType::Probe);
    }
}
