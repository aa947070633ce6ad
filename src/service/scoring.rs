//! Structural category scorers.
//!
//! Pure functions over [`PageData`]: no I/O, no randomness. Every category's
//! status comes from [`derive_status`] applied to its final score.

use crate::domain::models::{CategoryStatus, PageData, SeoCategory, Suggestion};

pub const TITLE_ID: &str = "title";
pub const DESCRIPTION_ID: &str = "description";
pub const IMAGES_ID: &str = "images";
pub const HEADINGS_ID: &str = "headings";
pub const CONTENT_ID: &str = "content";

const GOOD_THRESHOLD: u8 = 80;
const WARNING_THRESHOLD: u8 = 60;

const TITLE_MIN_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 60;
const DESCRIPTION_MIN_CHARS: usize = 120;
const DESCRIPTION_MAX_CHARS: usize = 160;

const THIN_CONTENT_WORDS: usize = 300;
const SOLID_CONTENT_WORDS: usize = 600;
const READABILITY_FLOOR: f64 = 60.0;
const READABILITY_PENALTY: i32 = 15;
const HEADING_STRUCTURE_PENALTY: i32 = 10;

/// Shared banding: >=80 good, >=60 warning, otherwise danger.
pub fn derive_status(score: u8) -> CategoryStatus {
    if score >= GOOD_THRESHOLD {
        CategoryStatus::Good
    } else if score >= WARNING_THRESHOLD {
        CategoryStatus::Warning
    } else {
        CategoryStatus::Danger
    }
}

/// Build a category whose status is derived from `score`.
pub fn category(id: &str, name: &str, score: u8, description: String, suggestions: Vec<Suggestion>) -> SeoCategory {
    let score = score.min(100);
    SeoCategory {
        id: id.to_string(),
        name: name.to_string(),
        status: derive_status(score),
        score,
        description,
        suggestions,
    }
}

/// The five structural categories in presentation order.
pub fn score_structure(page: &PageData) -> Vec<SeoCategory> {
    vec![
        score_title(page),
        score_description(page),
        score_images(page),
        score_headings(page),
        score_content(page),
    ]
}

pub fn score_title(page: &PageData) -> SeoCategory {
    let len = page.title.trim().chars().count();
    let (score, description, suggestions) = if len == 0 {
        (
            0,
            "The page has no title tag.".to_string(),
            vec![Suggestion::literal(
                "Add a unique, descriptive <title> of 30-60 characters that leads with your main keyword.",
            )],
        )
    } else if len < TITLE_MIN_CHARS {
        (
            60,
            format!("The title is only {len} characters long."),
            vec![Suggestion::literal(format!(
                "Expand the title to 30-60 characters; it is {len} now. Add your primary keyword and location or brand."
            ))],
        )
    } else if len > TITLE_MAX_CHARS {
        (
            75,
            format!("The title is {len} characters and will be truncated in search results."),
            vec![Suggestion::literal(format!(
                "Shorten the title to at most 60 characters (currently {len}) so it displays fully."
            ))],
        )
    } else {
        (
            95,
            format!("The title length ({len} characters) is within the recommended range."),
            vec![Suggestion::literal("Keep the title unique across pages and review it when the page focus changes.")],
        )
    };

    category(TITLE_ID, "Title Tag", score, description, suggestions)
}

pub fn score_description(page: &PageData) -> SeoCategory {
    let len = page.description.trim().chars().count();
    let (score, description, suggestions) = if len == 0 {
        (
            0,
            "The page has no meta description.".to_string(),
            vec![Suggestion::literal(
                "Add a meta description of 120-160 characters that summarizes the page and ends with a call to action.",
            )],
        )
    } else if len < DESCRIPTION_MIN_CHARS {
        (
            70,
            format!("The meta description is only {len} characters long."),
            vec![Suggestion::literal(format!(
                "Expand the meta description to 120-160 characters (currently {len}) with a clear benefit and call to action."
            ))],
        )
    } else if len > DESCRIPTION_MAX_CHARS {
        (
            75,
            format!("The meta description is {len} characters and will be cut off."),
            vec![Suggestion::literal(format!(
                "Trim the meta description to 160 characters or fewer (currently {len})."
            ))],
        )
    } else {
        (
            95,
            format!("The meta description length ({len} characters) is optimal."),
            vec![Suggestion::literal("Make sure the description matches the search intent of the page.")],
        )
    };

    category(DESCRIPTION_ID, "Meta Description", score, description, suggestions)
}

pub fn score_images(page: &PageData) -> SeoCategory {
    let total = page.images.len();
    if total == 0 {
        return category(
            IMAGES_ID,
            "Image Optimization",
            80,
            "No images found, so there is nothing to optimize.".to_string(),
            vec![Suggestion::literal(
                "Consider adding relevant images with descriptive alt text to enrich the page.",
            )],
        );
    }

    let with_alt = page.images_with_alt();
    let missing = total - with_alt;
    let coverage = with_alt as f64 / total as f64;

    let score = if missing == 0 {
        95
    } else if coverage >= 0.8 {
        85
    } else if coverage >= 0.5 {
        65
    } else {
        40
    };

    let mut suggestions = Vec::new();
    if missing > 0 {
        suggestions.push(Suggestion::literal(format!(
            "Add descriptive alt text to the {missing} of {total} images that lack it."
        )));
    }
    suggestions.push(Suggestion::literal(
        "Serve images in modern formats (WebP/AVIF) and lazy-load those below the fold.",
    ));

    category(
        IMAGES_ID,
        "Image Optimization",
        score,
        format!("{with_alt} of {total} images have alt text."),
        suggestions,
    )
}

pub fn score_headings(page: &PageData) -> SeoCategory {
    let h1 = page.h1_tags.len();
    let h2 = page.h2_tags.len();

    let (score, description, suggestion) = match (h1, h2) {
        (0, _) => (
            30,
            "The page has no H1 heading.".to_string(),
            "Add exactly one H1 that states the main topic of the page.".to_string(),
        ),
        (n, _) if n > 1 => (
            60,
            format!("The page has {n} H1 headings."),
            "Keep a single H1 and demote the others to H2 or H3.".to_string(),
        ),
        (_, 0) => (
            75,
            "The page has an H1 but no H2 subheadings.".to_string(),
            "Break the content into sections with descriptive H2 subheadings.".to_string(),
        ),
        (_, n) => (
            95,
            format!("One H1 and {n} H2 headings give the page a clear structure."),
            "Keep headings descriptive and in hierarchical order.".to_string(),
        ),
    };

    category(HEADINGS_ID, "Heading Structure", score, description, vec![Suggestion::literal(suggestion)])
}

/// Word-count band minus readability and heading penalties, clamped to 0..=100.
pub fn compute_raw_score(page: &PageData) -> u8 {
    let base: i32 = if page.word_count < THIN_CONTENT_WORDS {
        50
    } else if page.word_count < SOLID_CONTENT_WORDS {
        75
    } else {
        90
    };

    let mut score = base;
    if page.content_quality.readability_score < READABILITY_FLOOR {
        score -= READABILITY_PENALTY;
    }
    if !page.content_quality.heading_structure {
        score -= HEADING_STRUCTURE_PENALTY;
    }
    score.clamp(0, 100) as u8
}

pub fn score_content(page: &PageData) -> SeoCategory {
    let final_score = compute_raw_score(page);
    let quality = &page.content_quality;

    let mut suggestions = Vec::new();
    if page.word_count < THIN_CONTENT_WORDS {
        suggestions.push(Suggestion::literal(format!(
            "Expand the page beyond 300 words (currently {}); aim for 600+ words of useful content.",
            page.word_count
        )));
    } else if page.word_count < SOLID_CONTENT_WORDS {
        suggestions.push(Suggestion::literal(format!(
            "Grow the content toward 600+ words (currently {}) with answers to common customer questions.",
            page.word_count
        )));
    }
    if quality.readability_score < READABILITY_FLOOR {
        suggestions.push(Suggestion::literal(format!(
            "Shorten sentences to improve readability (score {:.0}/100).",
            quality.readability_score
        )));
    }
    if !quality.heading_structure {
        suggestions.push(Suggestion::literal(
            "Use one H1 followed by H2 sections so readers and crawlers can scan the content.",
        ));
    }
    if suggestions.is_empty() {
        suggestions.push(Suggestion::literal("Keep the content fresh and update it regularly."));
    }

    category(
        CONTENT_ID,
        "Content Quality",
        final_score,
        format!(
            "{} words, readability {:.0}/100, keyword density {:.2}%.",
            page.word_count, quality.readability_score, quality.keyword_density
        ),
        suggestions,
    )
}
