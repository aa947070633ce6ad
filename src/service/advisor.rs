//! Advisory synthesis.
//!
//! One generative request per analysis. Anything short of a complete advice
//! object (transport error, timeout, provider panic, malformed or partial JSON) falls back to
//! [`fallback_advice`], which is pure and always fully populated.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::models::{AiAdvice, BusinessType, PageData, SeoCategory, SiteType};
use crate::error::{AppError, Result};
use crate::extractor::page_extractor::{excerpt, EXCERPT_LIMIT};
use crate::service::gemini::{generate_isolated, strip_code_fence, GenerativeProvider};
use crate::service::scoring::{CONTENT_ID, DESCRIPTION_ID, HEADINGS_ID, IMAGES_ID, TITLE_ID};
use crate::service::telemetry::{MOBILE_ID, SPEED_ID};

const MAX_PRIORITY_ACTIONS: usize = 4;
const DESCRIPTION_SNIPPET_CHARS: usize = 60;

/// Everything the synthesizer needs, owned so it can move into a task.
#[derive(Debug, Clone)]
pub struct AdvisoryInput {
    pub categories: Vec<SeoCategory>,
    pub excerpt: String,
    pub title: String,
    pub description: String,
    pub image_count: usize,
    pub external_links: usize,
    pub overall_score: u8,
    pub business_type: BusinessType,
    pub site_type: Option<SiteType>,
}

impl AdvisoryInput {
    pub fn new(
        page: &PageData,
        categories: Vec<SeoCategory>,
        overall_score: u8,
        business_type: BusinessType,
        site_type: Option<SiteType>,
    ) -> Self {
        Self {
            categories,
            excerpt: excerpt(&page.text_excerpt, EXCERPT_LIMIT),
            title: page.title.trim().to_string(),
            description: page.description.trim().to_string(),
            image_count: page.images.len(),
            external_links: page.external_link_count(),
            overall_score,
            business_type,
            site_type,
        }
    }
}

/// Shape the provider is asked to return. Every field is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdviceResponse {
    overall_advice: String,
    priority_actions: Vec<String>,
    industry_specific_tips: Vec<String>,
    expected_results: String,
}

pub struct AdvisorySynthesizer {
    provider: Option<Arc<dyn GenerativeProvider>>,
    timeout: Duration,
    persona: String,
}

impl AdvisorySynthesizer {
    pub fn new(provider: Option<Arc<dyn GenerativeProvider>>, timeout: Duration, persona: impl Into<String>) -> Self {
        Self {
            provider,
            timeout,
            persona: persona.into(),
        }
    }

    /// Provider advice when it arrives complete, template advice otherwise.
    pub async fn synthesize(&self, input: &AdvisoryInput) -> AiAdvice {
        let Some(provider) = &self.provider else {
            tracing::debug!("[ADVISOR] No generative provider configured; using templates");
            return fallback_advice(input);
        };

        let prompt = build_prompt(input);
        let outcome = generate_isolated(provider, &self.persona, prompt, self.timeout)
            .await
            .and_then(|text| parse_advice(&text));

        match outcome {
            Ok(advice) => {
                tracing::info!("[ADVISOR] Generated advice with {} priority actions", advice.priority_actions.len());
                advice
            }
            Err(e) => {
                tracing::warn!("[ADVISOR] Generative advice unavailable: {} - using templates", e);
                fallback_advice(input)
            }
        }
    }
}

fn build_prompt(input: &AdvisoryInput) -> String {
    let category_lines = input
        .categories
        .iter()
        .map(|c| format!("- {} ({}): {}/100, {}. {}", c.name, c.id, c.score, c.status.as_str(), c.description))
        .collect::<Vec<_>>()
        .join("\n");

    let site_type = input.site_type.map(|s| s.label()).unwrap_or("unknown");

    format!(
        "Analyze this {business} website ({site_type}) and write SEO advice.\n\n\
         Page title: {title}\n\
         Meta description: {description}\n\
         Images on page: {images}\n\
         Links to other sites: {external_links}\n\
         Overall SEO score: {score}/100\n\n\
         Category results:\n{category_lines}\n\n\
         Page text excerpt:\n\"\"\"\n{excerpt}\n\"\"\"\n\n\
         Respond with a single JSON object and nothing else:\n\
         {{\"overallAdvice\": string, \"priorityActions\": [string], \
         \"industrySpecificTips\": [string], \"expectedResults\": string}}\n\
         Reference the real title and content above. Give at most four priority actions.",
        business = input.business_type.label(),
        title = non_empty_or(&input.title, "(missing)"),
        description = non_empty_or(&input.description, "(missing)"),
        images = input.image_count,
        external_links = input.external_links,
        score = input.overall_score,
        excerpt = input.excerpt,
    )
}

/// Accept the provider text only if it is a complete advice object.
pub fn parse_advice(text: &str) -> Result<AiAdvice> {
    let response: AdviceResponse = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::service("gemini", format!("advice is not a complete object: {e}")))?;

    if response.overall_advice.trim().is_empty() {
        return Err(AppError::service("gemini", "advice has an empty overallAdvice"));
    }

    Ok(AiAdvice {
        overall_advice: response.overall_advice.trim().to_string(),
        priority_actions: clean_list(response.priority_actions),
        industry_specific_tips: clean_list(response.industry_specific_tips),
        expected_results: response.expected_results.trim().to_string(),
    })
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ====== Templates ======

/// Deterministic advice assembled from the analysis alone.
pub fn fallback_advice(input: &AdvisoryInput) -> AiAdvice {
    let title = display_title(&input.title);
    let business = input.business_type.label();

    let overall_advice = if input.overall_score >= 80 {
        format!(
            "\"{title}\" is in strong shape with an overall score of {}/100. As a {business}, focus on \
             keeping content fresh and protecting the rankings you already have.",
            input.overall_score
        )
    } else if input.overall_score >= 60 {
        format!(
            "\"{title}\" has a solid base at {}/100, but a few fixes stand between this {business} \
             and better visibility. Work through the priority actions below in order.",
            input.overall_score
        )
    } else {
        format!(
            "\"{title}\" scores {}/100, which makes it hard for customers to find this {business} in \
             search. The priority actions below address the biggest gaps first.",
            input.overall_score
        )
    };

    AiAdvice {
        overall_advice,
        priority_actions: priority_actions(input),
        industry_specific_tips: industry_tips(input.business_type)
            .iter()
            .map(|tip| tip.to_string())
            .collect(),
        expected_results: format!(
            "Addressing these points should help \"{title}\" earn more qualified search traffic within \
             4-8 weeks, with better click-through from results pages and more enquiries for your {business}."
        ),
    }
}

/// Warning and danger categories, worst first, as action sentences.
pub fn priority_actions(input: &AdvisoryInput) -> Vec<String> {
    let mut flagged: Vec<&SeoCategory> = input
        .categories
        .iter()
        .filter(|c| c.status.needs_attention())
        .collect();
    // stable sort keeps category order for equal scores
    flagged.sort_by_key(|c| c.score);

    let mut actions: Vec<String> = flagged
        .into_iter()
        .take(MAX_PRIORITY_ACTIONS)
        .map(|c| action_for(c, input))
        .collect();

    if actions.is_empty() {
        actions.push(format!(
            "Keep \"{}\" up to date and monitor its rankings monthly to hold your current position.",
            display_title(&input.title)
        ));
    }
    actions
}

fn action_for(category: &SeoCategory, input: &AdvisoryInput) -> String {
    let title = display_title(&input.title);
    match category.id.as_str() {
        TITLE_ID => format!(
            "Rewrite the title \"{title}\" ({} characters) to 30-60 characters that lead with your main keyword.",
            input.title.chars().count()
        ),
        DESCRIPTION_ID if input.description.is_empty() => format!(
            "Add a 120-160 character meta description that tells searchers what \"{title}\" offers."
        ),
        DESCRIPTION_ID => format!(
            "Rework the meta description \"{}\" to 120-160 characters with a clear call to action.",
            description_snippet(&input.description)
        ),
        IMAGES_ID => format!(
            "Add descriptive alt text to the images on the page ({} found) so they can rank in image search.",
            input.image_count
        ),
        HEADINGS_ID => format!(
            "Give \"{title}\" a single H1 and organize the sections under H2 subheadings."
        ),
        CONTENT_ID => format!(
            "Expand and simplify the copy on \"{title}\" with shorter sentences and answers to common customer questions."
        ),
        SPEED_ID => format!(
            "Improve load speed (score {}/100) by compressing the {} images and deferring non-critical scripts.",
            category.score, input.image_count
        ),
        MOBILE_ID => "Make the page mobile-friendly with a responsive viewport and tap-sized buttons.".to_string(),
        _ => format!("Improve {} (currently {}/100).", category.name, category.score),
    }
}

/// Three tips per business type.
pub fn industry_tips(business: BusinessType) -> &'static [&'static str; 3] {
    match business {
        BusinessType::Restaurant => &[
            "Keep your Google Business Profile hours, menu link and photos current.",
            "Publish your menu as HTML text rather than a PDF or image so it can be indexed.",
            "Add Restaurant structured data with cuisine, price range and opening hours.",
        ],
        BusinessType::Ecommerce => &[
            "Write unique product descriptions instead of reusing manufacturer copy.",
            "Add Product structured data with price, availability and reviews.",
            "Link related products and categories to spread authority across the catalogue.",
        ],
        BusinessType::Healthcare => &[
            "Show practitioner credentials and medical review dates on health content.",
            "Create a page per service and per location you serve.",
            "Add MedicalOrganization structured data and keep contact details consistent.",
        ],
        BusinessType::Education => &[
            "Give each course or program its own page with outcomes and admission details.",
            "Add Course structured data so listings can appear in rich results.",
            "Publish student success stories and answer common enrollment questions.",
        ],
        BusinessType::RealEstate => &[
            "Create neighborhood guides targeting local search phrases.",
            "Use descriptive, unique text for every listing instead of feed boilerplate.",
            "Add RealEstateAgent structured data and keep listings fresh.",
        ],
        BusinessType::Technology => &[
            "Publish documentation and use-case pages that match what buyers search for.",
            "Add SoftwareApplication or Product structured data with pricing.",
            "Build comparison and integration pages for the tools your customers already use.",
        ],
        BusinessType::Beauty => &[
            "Show before-and-after galleries with descriptive alt text.",
            "List every service with prices on its own crawlable page.",
            "Encourage reviews on your Google Business Profile and respond to them.",
        ],
        BusinessType::Legal => &[
            "Create a dedicated page for each practice area and jurisdiction.",
            "Publish plain-language guides that answer common legal questions.",
            "Add LegalService structured data and display attorney credentials.",
        ],
        BusinessType::Other => &[
            "Claim and complete your Google Business Profile.",
            "Publish helpful content that answers the questions your customers ask most.",
            "Earn links from local directories and partner websites.",
        ],
    }
}

fn display_title(title: &str) -> &str {
    non_empty_or(title, "your page")
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

fn description_snippet(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_SNIPPET_CHARS {
        return description.to_string();
    }
    let cut: String = description.chars().take(DESCRIPTION_SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}
