//! Shared fixtures and mock providers for unit, integration and bench code.

/// Pre-built domain values.
pub mod fixtures {
    use std::time::Duration;

    use crate::config::EngineConfig;
    use crate::domain::models::{ContentQuality, PageData};
    use crate::extractor::content_quality::NEUTRAL_READABILITY;

    /// What extraction yields for a document with no content at all.
    pub fn empty_page() -> PageData {
        PageData {
            content_quality: ContentQuality {
                readability_score: NEUTRAL_READABILITY,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Config with short timeouts and every real provider pointed at `base_url`.
    pub fn test_config(base_url: &str) -> EngineConfig {
        EngineConfig {
            user_agent: "site-analyzer-test/1.0".into(),
            fetch_timeout: Duration::from_secs(5),
            pagespeed_endpoint: format!("{base_url}/pagespeedonline/v5/runPagespeed"),
            telemetry_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(2),
            gemini_endpoint: format!("{base_url}/v1beta"),
            generative_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }
}

/// HTML and provider payloads plus in-process provider doubles.
pub mod mocks {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::{AppError, Result};
    use crate::service::gemini::GenerativeProvider;
    use crate::service::telemetry::{
        FieldCategory, FieldData, FieldMetric, LabCategory, LabData, LatencyProbe, PerformanceProvider,
        ProviderReport,
    };

    /// A small restaurant page with every extractable element present.
    pub fn well_formed_page() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Luigi's Trattoria - Fresh Italian Pasta in Portland</title>
    <meta name="description" content="Luigi's Trattoria serves handmade pasta, wood-fired dishes and Italian wines in downtown Portland. Book a table for lunch or dinner today.">
    <meta name="keywords" content="italian restaurant, fresh pasta, portland dining">
    <link rel="canonical" href="https://example.com/menu">
    <meta property="og:title" content="Luigi's Trattoria">
    <meta property="og:description" content="Handmade pasta in Portland">
    <meta property="og:image" content="https://example.com/img/og.jpg">
    <meta property="og:url" content="https://example.com/menu">
    <script type="application/ld+json">
    {"@context": "https://schema.org", "@type": "Restaurant", "name": "Luigi's Trattoria", "servesCuisine": "Italian"}
    </script>
    <style>body { font-family: serif; }</style>
</head>
<body>
    <h1>Fresh Pasta Every Day</h1>
    <p>Our chef rolls every sheet of pasta by hand each morning. The sauces simmer for hours. Every dish uses local produce.</p>
    <img src="/img/pasta.jpg" alt="Plate of pasta">
    <h2>Our Menu</h2>
    <p>Try the tagliatelle with slow-cooked ragu. The mushroom risotto is a house favourite. Finish with our tiramisu.</p>
    <img src="https://cdn.example.net/chef.png" alt="Chef Luigi at work" title="Our chef">
    <a href="/reservations">Book a table</a>
    <h2>Visit Us</h2>
    <p>We are open for lunch and dinner from Tuesday to Sunday. Find us near the river.</p>
    <a href="https://maps.example.org/place">Find us on the map</a>
    <a href="/gallery"><img src="img/gallery.jpg" alt="Gallery"></a>
    <script>window.dataLayer = [];</script>
</body>
</html>"#
            .to_string()
    }

    /// PageSpeed Insights v5 body with the given performance score.
    ///
    /// `overall` adds a field data block with that overall category.
    pub fn pagespeed_json(performance: f64, overall: Option<&str>) -> String {
        let loading_experience = match overall {
            Some(category) => json!({
                "id": "https://example.com/",
                "metrics": {
                    "LARGEST_CONTENTFUL_PAINT_MS": { "percentile": 2100, "category": "FAST" },
                    "CUMULATIVE_LAYOUT_SHIFT_SCORE": { "percentile": 4, "category": "FAST" },
                    "INTERACTION_TO_NEXT_PAINT": { "percentile": 180, "category": "AVERAGE" }
                },
                "overall_category": category
            }),
            None => json!({ "initial_url": "https://example.com/" }),
        };

        json!({
            "loadingExperience": loading_experience,
            "lighthouseResult": {
                "categories": {
                    "performance": {
                        "score": performance,
                        "auditRefs": [
                            { "id": "render-blocking-resources" },
                            { "id": "unused-javascript" },
                            { "id": "diagnostics" },
                            { "id": "first-contentful-paint" }
                        ]
                    },
                    "accessibility": {
                        "score": 0.88,
                        "auditRefs": [{ "id": "color-contrast" }]
                    },
                    "best-practices": { "score": 1.0, "auditRefs": [] },
                    "seo": { "score": 0.92, "auditRefs": [{ "id": "viewport" }] }
                },
                "audits": {
                    "render-blocking-resources": {
                        "title": "Eliminate render-blocking resources",
                        "score": 0.3,
                        "scoreDisplayMode": "metricSavings"
                    },
                    "unused-javascript": {
                        "title": "Reduce unused JavaScript",
                        "score": 0.5,
                        "scoreDisplayMode": "metricSavings"
                    },
                    "diagnostics": {
                        "title": "Diagnostics",
                        "score": null,
                        "scoreDisplayMode": "informative"
                    },
                    "first-contentful-paint": {
                        "title": "First Contentful Paint",
                        "score": 0.95,
                        "scoreDisplayMode": "numeric"
                    },
                    "color-contrast": {
                        "title": "Background and foreground colors do not have a sufficient contrast ratio.",
                        "score": 0,
                        "scoreDisplayMode": "binary"
                    },
                    "viewport": {
                        "title": "Has a `<meta name=\"viewport\">` tag with `width` or `initial-scale`",
                        "score": 1,
                        "scoreDisplayMode": "binary"
                    }
                }
            }
        })
        .to_string()
    }

    /// Gemini `generateContent` body whose first candidate carries `text`.
    pub fn gemini_body(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    // ====== Performance providers ======

    #[derive(Clone)]
    pub struct StaticPerformanceProvider {
        report: ProviderReport,
        delay: Option<Duration>,
    }

    impl StaticPerformanceProvider {
        pub fn new(report: ProviderReport) -> Self {
            Self { report, delay: None }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Report with the given lab performance score and optional field verdict.
        pub fn report(performance: u8, overall: Option<FieldCategory>) -> ProviderReport {
            let issues = vec!["Reduce unused JavaScript".to_string()];
            let field_data = overall.map(|category| FieldData {
                metrics: BTreeMap::from([(
                    "LARGEST_CONTENTFUL_PAINT_MS".to_string(),
                    FieldMetric {
                        percentile: 2100.0,
                        category,
                    },
                )]),
                overall_category: Some(category),
            });

            ProviderReport {
                lab_data: LabData {
                    performance: LabCategory {
                        score: performance,
                        issues: issues.clone(),
                    },
                    accessibility: LabCategory::new(88),
                    best_practices: LabCategory::new(90),
                    seo: LabCategory::new(92),
                },
                field_data,
                viewport_passed: Some(true),
                opportunities: issues,
            }
        }
    }

    #[async_trait]
    impl PerformanceProvider for StaticPerformanceProvider {
        async fn run(&self, _url: &str) -> Result<ProviderReport> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.report.clone())
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    pub struct FailingPerformanceProvider;

    #[async_trait]
    impl PerformanceProvider for FailingPerformanceProvider {
        async fn run(&self, _url: &str) -> Result<ProviderReport> {
            Err(AppError::service("pagespeed", "quota exceeded"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    // ====== Probes ======

    /// Always reports the wrapped latency.
    pub struct FixedProbe(pub Duration);

    #[async_trait]
    impl LatencyProbe for FixedProbe {
        async fn measure(&self, _url: &str) -> Result<Duration> {
            Ok(self.0)
        }
    }

    pub struct FailingProbe;

    #[async_trait]
    impl LatencyProbe for FailingProbe {
        async fn measure(&self, url: &str) -> Result<Duration> {
            Err(AppError::service("probe", format!("HEAD {url} refused")))
        }
    }

    // ====== Generative providers ======

    /// Returns a fixed text and records every prompt it receives.
    #[derive(Clone)]
    pub struct StaticGenerativeProvider {
        response: String,
        delay: Option<Duration>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl StaticGenerativeProvider {
        pub fn new(response: impl Into<String>) -> Self {
            Self {
                response: response.into(),
                delay: None,
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl GenerativeProvider for StaticGenerativeProvider {
        async fn generate(&self, _instruction: &str, prompt: &str) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.response.clone())
        }
    }

    pub struct FailingGenerativeProvider;

    #[async_trait]
    impl GenerativeProvider for FailingGenerativeProvider {
        async fn generate(&self, _instruction: &str, _prompt: &str) -> Result<String> {
            Err(AppError::service("gemini", "connection reset"))
        }
    }

    /// A scripted answer for [`RoutedGenerativeProvider`].
    #[derive(Clone)]
    pub enum Reply {
        Text(String),
        /// Answer only after the delay
        Slow(Duration, String),
    }

    impl Reply {
        pub fn text(text: impl Into<String>) -> Self {
            Reply::Text(text.into())
        }
    }

    /// Answers advisory prompts and keyword prompts with separate replies.
    pub struct RoutedGenerativeProvider {
        advice: Reply,
        keywords: Reply,
    }

    impl RoutedGenerativeProvider {
        pub fn new(advice: Reply, keywords: Reply) -> Self {
            Self { advice, keywords }
        }
    }

    #[async_trait]
    impl GenerativeProvider for RoutedGenerativeProvider {
        async fn generate(&self, _instruction: &str, prompt: &str) -> Result<String> {
            // only the advisory prompt spells out the advice object shape
            let reply = if prompt.contains("overallAdvice") {
                &self.advice
            } else {
                &self.keywords
            };
            match reply {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Slow(delay, text) => {
                    tokio::time::sleep(*delay).await;
                    Ok(text.clone())
                }
            }
        }
    }

    /// Panics on every call; exercises task isolation in the orchestrator.
    pub struct PanickingGenerativeProvider;

    #[async_trait]
    impl GenerativeProvider for PanickingGenerativeProvider {
        async fn generate(&self, _instruction: &str, _prompt: &str) -> Result<String> {
            panic!("generative provider exploded")
        }
    }
}

/// Helper assertions for tests
pub mod assertions {
    use crate::domain::models::{AnalysisResult, SeoCategory};

    pub fn category<'a>(result: &'a AnalysisResult, id: &str) -> &'a SeoCategory {
        result
            .category(id)
            .unwrap_or_else(|| panic!("category {id} missing from result"))
    }

    /// Every category's status agrees with its score bands.
    pub fn statuses_consistent(categories: &[SeoCategory]) -> bool {
        categories
            .iter()
            .all(|c| c.status == crate::service::scoring::derive_status(c.score))
    }
}
