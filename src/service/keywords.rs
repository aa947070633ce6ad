use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{BusinessType, PageData};
use crate::error::{AppError, Result};
use crate::service::gemini::{generate_isolated, strip_code_fence, GenerativeProvider};

pub const MAX_KEYWORDS: usize = 5;
const TABLE_LEAD: usize = 3;
const TITLE_WORDS: usize = 2;

const KEYWORD_INSTRUCTION: &str =
    "You are an SEO keyword researcher. Answer with a JSON array of strings only.";

/// Suggests up to five search keywords for a page.
pub struct KeywordSuggester {
    provider: Option<Arc<dyn GenerativeProvider>>,
    timeout: Duration,
}

impl KeywordSuggester {
    pub fn new(provider: Option<Arc<dyn GenerativeProvider>>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn suggest(&self, page: &PageData, business: BusinessType) -> Vec<String> {
        let Some(provider) = &self.provider else {
            return fallback_keywords(page, business);
        };

        let prompt = build_prompt(page, business);
        let outcome = generate_isolated(provider, KEYWORD_INSTRUCTION, prompt, self.timeout)
            .await
            .and_then(|text| parse_keywords(&text));

        match outcome {
            Ok(keywords) => {
                tracing::info!("[KEYWORDS] Generated {} keyword suggestions", keywords.len());
                keywords
            }
            Err(e) => {
                tracing::warn!("[KEYWORDS] Generative keywords unavailable: {} - using keyword table", e);
                fallback_keywords(page, business)
            }
        }
    }
}

fn build_prompt(page: &PageData, business: BusinessType) -> String {
    let headings = page
        .h1_tags
        .iter()
        .chain(page.h2_tags.iter())
        .take(6)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" | ");

    format!(
        "Suggest up to {MAX_KEYWORDS} search keywords a customer would type to find this {}.\n\
         Title: {}\nDescription: {}\nHeadings: {}\n\
         Return a JSON array of strings, for example [\"keyword one\", \"keyword two\"].",
        business.label(),
        page.title.trim(),
        page.description.trim(),
        headings,
    )
}

/// Accept only a non-empty JSON array of strings.
pub fn parse_keywords(text: &str) -> Result<Vec<String>> {
    let raw: Vec<String> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::service("gemini", format!("keywords are not a string array: {e}")))?;

    let keywords: Vec<String> = raw
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .collect();

    if keywords.is_empty() {
        return Err(AppError::service("gemini", "keyword array is empty"));
    }
    Ok(keywords)
}

/// Deterministic keywords: table lead, title words, then the table remainder.
pub fn fallback_keywords(page: &PageData, business: BusinessType) -> Vec<String> {
    let table = keyword_table(business);
    let mut keywords: Vec<String> = table.iter().take(TABLE_LEAD).map(|k| k.to_string()).collect();

    let title_words = page
        .title
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() > 1 && !is_stopword(w));

    let mut added = 0;
    for word in title_words {
        if added == TITLE_WORDS {
            break;
        }
        if !keywords.contains(&word) {
            keywords.push(word);
            added += 1;
        }
    }

    for k in table.iter().skip(TABLE_LEAD) {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        let k = k.to_string();
        if !keywords.contains(&k) {
            keywords.push(k);
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}

fn is_stopword(word: &str) -> bool {
    matches!(
        word,
        "the" | "and" | "for" | "with" | "in" | "of" | "on" | "to" | "at" | "by" | "an" | "or" | "our" | "your"
    )
}

pub fn keyword_table(business: BusinessType) -> &'static [&'static str] {
    match business {
        BusinessType::Restaurant => &[
            "restaurant near me",
            "best restaurant",
            "local dining",
            "food delivery",
            "table reservation",
        ],
        BusinessType::Ecommerce => &[
            "buy online",
            "online shop",
            "free shipping",
            "best price",
            "discount deals",
        ],
        BusinessType::Healthcare => &[
            "doctor near me",
            "medical clinic",
            "healthcare services",
            "book appointment",
            "family doctor",
        ],
        BusinessType::Education => &[
            "online courses",
            "training programs",
            "learn skills",
            "certification",
            "tutoring",
        ],
        BusinessType::RealEstate => &[
            "homes for sale",
            "real estate agent",
            "property listings",
            "apartments for rent",
            "house prices",
        ],
        BusinessType::Technology => &[
            "software solutions",
            "it services",
            "cloud platform",
            "tech support",
            "saas tools",
        ],
        BusinessType::Beauty => &[
            "beauty salon near me",
            "hair salon",
            "spa treatments",
            "skincare",
            "nail salon",
        ],
        BusinessType::Legal => &[
            "lawyer near me",
            "legal advice",
            "law firm",
            "attorney consultation",
            "legal services",
        ],
        BusinessType::Other => &[
            "local business",
            "services near me",
            "best services",
            "professional services",
            "contact us",
        ],
    }
}
