//! Shared types for performance telemetry.
//!
//! These types are provider-agnostic and are produced by every fallback tier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provider score on the 0.0-1.0 scale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Score(pub f64);

impl Score {
    /// Convert to an integer percentage (0 - 100)
    pub fn integer(&self) -> u8 {
        (self.0.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

impl From<f64> for Score {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

/// Which tier of the cascade produced a telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Performance provider answered (lab data, possibly field data)
    Full,
    /// Provider unavailable; a single timed HEAD request
    Probe,
    /// Nothing reachable; fixed values
    Heuristic,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Full => "full",
            AnalysisType::Probe => "probe",
            AnalysisType::Heuristic => "heuristic",
        }
    }
}

/// One lab category: integer score 0-100 and the failing audits behind it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabCategory {
    pub score: u8,
    pub issues: Vec<String>,
}

impl LabCategory {
    pub fn new(score: u8) -> Self {
        Self {
            score,
            issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabData {
    pub performance: LabCategory,
    pub accessibility: LabCategory,
    pub best_practices: LabCategory,
    pub seo: LabCategory,
}

impl LabData {
    /// Every category at the same score.
    pub fn uniform(score: u8) -> Self {
        Self {
            performance: LabCategory::new(score),
            accessibility: LabCategory::new(score),
            best_practices: LabCategory::new(score),
            seo: LabCategory::new(score),
        }
    }
}

/// Real-user experience bucket reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldCategory {
    Fast,
    Average,
    Slow,
}

impl FieldCategory {
    /// Parse the provider's label. `NONE` and unknown values yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "FAST" => Some(FieldCategory::Fast),
            "AVERAGE" => Some(FieldCategory::Average),
            "SLOW" => Some(FieldCategory::Slow),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldCategory::Fast => "FAST",
            FieldCategory::Average => "AVERAGE",
            FieldCategory::Slow => "SLOW",
        }
    }

    /// Speed score that real-user data imposes over the lab score.
    pub fn speed_score(&self) -> u8 {
        match self {
            FieldCategory::Fast => 95,
            FieldCategory::Average => 75,
            FieldCategory::Slow => 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetric {
    pub percentile: f64,
    pub category: FieldCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldData {
    pub metrics: BTreeMap<String, FieldMetric>,
    pub overall_category: Option<FieldCategory>,
}

/// Output of the telemetry cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTelemetry {
    pub lab_data: LabData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_data: Option<FieldData>,
    pub analysis_type: AnalysisType,
    pub has_field_data: bool,
    pub improvements: Vec<String>,
    pub viewport_passed: bool,
    /// Round-trip time of the probe tier, when that tier produced the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_latency_ms: Option<u64>,
}

/// Lab scores and optional field data as returned by a performance provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReport {
    pub lab_data: LabData,
    pub field_data: Option<FieldData>,
    /// `None` when the provider did not report a viewport audit.
    pub viewport_passed: Option<bool>,
    pub opportunities: Vec<String>,
}
