//! Domain entities produced and consumed by the analysis pipeline.
//!
//! Everything here serializes to camelCase JSON for the presentation layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ====== Page data ======

/// Structured record extracted from one fetched HTML document.
///
/// Every field has an empty/zero/false default; extraction fills what it can.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub images: Vec<ImageElement>,
    pub links: Vec<LinkElement>,
    pub word_count: usize,
    pub lang: String,
    pub charset: String,
    pub viewport: String,
    pub canonical_url: String,
    pub og_tags: OgTags,
    pub structured_data: Vec<serde_json::Value>,
    pub content_quality: ContentQuality,
    pub text_excerpt: String,
}

impl PageData {
    /// True when the page declares a device-width viewport.
    pub fn has_mobile_viewport(&self) -> bool {
        self.viewport.to_ascii_lowercase().contains("width=device-width")
    }

    pub fn images_with_alt(&self) -> usize {
        self.images.iter().filter(|img| img.has_alt()).count()
    }

    pub fn external_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_external).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    pub src: String,
    pub alt: String,
    pub title: String,
}

impl ImageElement {
    pub fn has_alt(&self) -> bool {
        !self.alt.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkElement {
    pub href: String,
    pub text: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgTags {
    pub title: String,
    pub description: String,
    pub image: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQuality {
    pub readability_score: f64,
    pub keyword_density: f64,
    pub heading_structure: bool,
}

// ====== Categories ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Good,
    Warning,
    Danger,
}

impl CategoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStatus::Good => "good",
            CategoryStatus::Warning => "warning",
            CategoryStatus::Danger => "danger",
        }
    }

    pub fn needs_attention(&self) -> bool {
        !matches!(self, CategoryStatus::Good)
    }
}

/// One piece of per-category guidance.
///
/// `Literal` is display text. `TranslationKey` is a catalogue key plus
/// substitution parameters for presentation layers that localize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Suggestion {
    Literal {
        text: String,
    },
    TranslationKey {
        key: String,
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
}

impl Suggestion {
    pub fn literal(text: impl Into<String>) -> Self {
        Suggestion::Literal { text: text.into() }
    }

    pub fn key<K, V>(key: impl Into<String>, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Suggestion::TranslationKey {
            key: key.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Plain-text rendering for consumers without a translation catalogue.
    pub fn render(&self) -> String {
        match self {
            Suggestion::Literal { text } => text.clone(),
            Suggestion::TranslationKey { key, params } if params.is_empty() => key.clone(),
            Suggestion::TranslationKey { key, params } => {
                let args = params
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{key} ({args})")
            }
        }
    }
}

/// One scored dimension of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoCategory {
    pub id: String,
    pub name: String,
    pub status: CategoryStatus,
    pub score: u8,
    pub description: String,
    pub suggestions: Vec<Suggestion>,
}

// ====== Classification ======

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BusinessType {
    Restaurant,
    Ecommerce,
    Healthcare,
    Education,
    RealEstate,
    Technology,
    Beauty,
    Legal,
    Other,
}

impl BusinessType {
    pub const ALL: [BusinessType; 9] = [
        BusinessType::Restaurant,
        BusinessType::Ecommerce,
        BusinessType::Healthcare,
        BusinessType::Education,
        BusinessType::RealEstate,
        BusinessType::Technology,
        BusinessType::Beauty,
        BusinessType::Legal,
        BusinessType::Other,
    ];

    /// Human-readable label used in prompts and templates.
    pub fn label(&self) -> &'static str {
        match self {
            BusinessType::Restaurant => "restaurant",
            BusinessType::Ecommerce => "online store",
            BusinessType::Healthcare => "healthcare practice",
            BusinessType::Education => "education provider",
            BusinessType::RealEstate => "real estate business",
            BusinessType::Technology => "technology company",
            BusinessType::Beauty => "beauty and wellness business",
            BusinessType::Legal => "law firm",
            BusinessType::Other => "business",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiteType {
    Ecommerce,
    Blog,
    Corporate,
    Portfolio,
    LandingPage,
}

impl SiteType {
    pub fn label(&self) -> &'static str {
        match self {
            SiteType::Ecommerce => "e-commerce site",
            SiteType::Blog => "blog",
            SiteType::Corporate => "corporate site",
            SiteType::Portfolio => "portfolio",
            SiteType::LandingPage => "landing page",
        }
    }
}

// ====== Result ======

/// Generated (or template-assembled) guidance for the whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAdvice {
    pub overall_advice: String,
    pub priority_actions: Vec<String>,
    pub industry_specific_tips: Vec<String>,
    pub expected_results: String,
}

/// The outcome of one `analyze` call. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub overall_score: u8,
    pub categories: Vec<SeoCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_advice: Option<AiAdvice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_type: Option<SiteType>,
    pub business_type: BusinessType,
    pub telemetry_source: crate::service::telemetry::AnalysisType,
}

impl AnalysisResult {
    pub fn category(&self, id: &str) -> Option<&SeoCategory> {
        self.categories.iter().find(|c| c.id == id)
    }
}

/// Rounded arithmetic mean of every category score; 0 for an empty list.
pub fn overall_score(categories: &[SeoCategory]) -> u8 {
    if categories.is_empty() {
        return 0;
    }
    let total: f64 = categories.iter().map(|c| c.score as f64).sum();
    (total / categories.len() as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, score: u8) -> SeoCategory {
        SeoCategory {
            id: id.to_string(),
            name: id.to_string(),
            status: CategoryStatus::Good,
            score,
            description: String::new(),
            suggestions: vec![],
        }
    }

    #[test]
    fn overall_score_is_rounded_mean() {
        let cats = vec![category("a", 95), category("b", 0), category("c", 30)];
        // 125 / 3 = 41.67
        assert_eq!(overall_score(&cats), 42);
        assert_eq!(overall_score(&[]), 0);
    }

    #[test]
    fn suggestion_serializes_with_kind_tag() {
        let s = Suggestion::key("telemetry.fieldData", [("category", "FAST")]);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"], "translationKey");
        assert_eq!(json["key"], "telemetry.fieldData");
        assert_eq!(json["params"]["category"], "FAST");

        let lit = serde_json::to_value(Suggestion::literal("Add a title")).unwrap();
        assert_eq!(lit["kind"], "literal");
        assert_eq!(lit["text"], "Add a title");
    }

    #[test]
    fn suggestion_render_includes_params() {
        let s = Suggestion::key("telemetry.probe", [("latencyMs", "420")]);
        assert_eq!(s.render(), "telemetry.probe (latencyMs=420)");
        assert_eq!(Suggestion::literal("x").render(), "x");
    }

    #[test]
    fn page_data_defaults_are_empty() {
        let page = PageData::default();
        assert!(page.title.is_empty());
        assert_eq!(page.word_count, 0);
        assert!(!page.content_quality.heading_structure);
        assert!(!page.has_mobile_viewport());
    }
}
