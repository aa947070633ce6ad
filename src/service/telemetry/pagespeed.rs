//! PageSpeed Insights provider.
//!
//! Queries the PageSpeed Insights v5 API with the mobile strategy and converts
//! its Lighthouse lab tree and Chrome UX Report field tree into a
//! [`ProviderReport`].

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::types::{FieldCategory, FieldData, FieldMetric, LabCategory, LabData, ProviderReport, Score};
use super::PerformanceProvider;
use crate::config::EngineConfig;
use crate::error::{AppError, Result};
use crate::service::http::{create_client, ClientType};

const SERVICE: &str = "pagespeed";

/// Audits scoring below this are reported as issues.
const ISSUE_THRESHOLD: f64 = 0.9;
const MAX_ISSUES_PER_CATEGORY: usize = 5;

/// Raw response from the PageSpeed Insights API
#[derive(Debug, Deserialize)]
struct PsiResponse {
    #[serde(rename = "loadingExperience", default)]
    loading_experience: Option<PsiLoadingExperience>,
    #[serde(rename = "lighthouseResult", default)]
    lighthouse_result: Option<PsiLighthouseResult>,
}

#[derive(Debug, Deserialize, Default)]
struct PsiLoadingExperience {
    #[serde(default)]
    metrics: BTreeMap<String, PsiFieldMetric>,
    #[serde(default)]
    overall_category: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PsiFieldMetric {
    #[serde(default)]
    percentile: Option<f64>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PsiLighthouseResult {
    #[serde(default)]
    categories: PsiCategories,
    #[serde(default)]
    audits: HashMap<String, PsiAudit>,
}

#[derive(Debug, Deserialize, Default)]
struct PsiCategories {
    performance: Option<PsiCategory>,
    accessibility: Option<PsiCategory>,
    #[serde(rename = "best-practices")]
    best_practices: Option<PsiCategory>,
    seo: Option<PsiCategory>,
}

#[derive(Debug, Deserialize, Default)]
struct PsiCategory {
    #[serde(default)]
    score: Option<f64>,
    #[serde(rename = "auditRefs", default)]
    audit_refs: Vec<PsiAuditRef>,
}

#[derive(Debug, Deserialize)]
struct PsiAuditRef {
    id: String,
}

#[derive(Debug, Deserialize, Default)]
struct PsiAudit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(rename = "scoreDisplayMode", default)]
    score_display_mode: Option<String>,
}

impl PsiAudit {
    fn is_scored(&self) -> bool {
        !matches!(
            self.score_display_mode.as_deref(),
            Some("informative") | Some("notApplicable") | Some("manual") | Some("error")
        )
    }
}

/// Client for the PageSpeed Insights API.
pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PageSpeedClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(ClientType::Api, &config.user_agent, config.telemetry_timeout)?,
            endpoint: config.pagespeed_endpoint.clone(),
            api_key: config.pagespeed_api_key.clone(),
        })
    }

    fn query(&self, url: &str) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("url", url.to_string()),
            ("strategy", "mobile".to_string()),
            ("category", "performance".to_string()),
            ("category", "accessibility".to_string()),
            ("category", "best-practices".to_string()),
            ("category", "seo".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }
        query
    }
}

#[async_trait]
impl PerformanceProvider for PageSpeedClient {
    async fn run(&self, url: &str) -> Result<ProviderReport> {
        tracing::info!("[TELEMETRY] Requesting PageSpeed report for: {}", url);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(url))
            .send()
            .await
            .map_err(|e| AppError::service(SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::service(
                SERVICE,
                format!("API error {}: {}", status, error_text.chars().take(200).collect::<String>()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::service(SERVICE, format!("failed to read body: {e}")))?;

        parse_report(&body)
    }

    fn name(&self) -> &'static str {
        "PageSpeed Insights"
    }
}

/// Convert a raw PageSpeed JSON body into a [`ProviderReport`].
pub fn parse_report(body: &str) -> Result<ProviderReport> {
    let response: PsiResponse = serde_json::from_str(body)
        .map_err(|e| AppError::service(SERVICE, format!("malformed response: {e}")))?;

    let lighthouse = response
        .lighthouse_result
        .ok_or_else(|| AppError::service(SERVICE, "response has no lighthouseResult"))?;

    let performance_score = lighthouse
        .categories
        .performance
        .as_ref()
        .and_then(|c| c.score)
        .ok_or_else(|| AppError::service(SERVICE, "response has no performance score"))?;

    let lab_category = |category: Option<&PsiCategory>, fallback: Option<f64>| -> LabCategory {
        let score = category.and_then(|c| c.score).or(fallback).unwrap_or(0.0);
        LabCategory {
            score: Score::from(score).integer(),
            issues: category
                .map(|c| failing_audits(c, &lighthouse.audits))
                .unwrap_or_default(),
        }
    };

    let lab_data = LabData {
        performance: lab_category(lighthouse.categories.performance.as_ref(), Some(performance_score)),
        accessibility: lab_category(lighthouse.categories.accessibility.as_ref(), None),
        best_practices: lab_category(lighthouse.categories.best_practices.as_ref(), None),
        seo: lab_category(lighthouse.categories.seo.as_ref(), None),
    };

    let viewport_passed = lighthouse
        .audits
        .get("viewport")
        .and_then(|a| a.score)
        .map(|s| s >= 0.5);

    let field_data = response.loading_experience.and_then(convert_field_data);

    Ok(ProviderReport {
        opportunities: lab_data.performance.issues.clone(),
        lab_data,
        field_data,
        viewport_passed,
    })
}

/// Titles of scored audits below the threshold, worst first.
fn failing_audits(category: &PsiCategory, audits: &HashMap<String, PsiAudit>) -> Vec<String> {
    let mut failing: Vec<(f64, &str)> = category
        .audit_refs
        .iter()
        .filter_map(|r| audits.get(&r.id))
        .filter(|a| a.is_scored() && !a.title.is_empty())
        .filter_map(|a| a.score.filter(|s| *s < ISSUE_THRESHOLD).map(|s| (s, a.title.as_str())))
        .collect();
    // stable: ties keep the provider's audit order
    failing.sort_by(|a, b| a.0.total_cmp(&b.0));
    failing
        .into_iter()
        .take(MAX_ISSUES_PER_CATEGORY)
        .map(|(_, title)| title.to_string())
        .collect()
}

fn convert_field_data(experience: PsiLoadingExperience) -> Option<FieldData> {
    let metrics: BTreeMap<String, FieldMetric> = experience
        .metrics
        .into_iter()
        .filter_map(|(name, metric)| {
            let category = FieldCategory::parse(metric.category.as_deref()?)?;
            Some((
                name,
                FieldMetric {
                    percentile: metric.percentile?,
                    category,
                },
            ))
        })
        .collect();

    if metrics.is_empty() {
        return None;
    }

    Some(FieldData {
        metrics,
        overall_category: experience.overall_category.as_deref().and_then(FieldCategory::parse),
    })
}
