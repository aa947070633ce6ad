//! Text-level quality signals: readability, title keyword density, heading shape.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::domain::models::ContentQuality;

/// Readability reported when the text has no sentences at all.
pub const NEUTRAL_READABILITY: f64 = 50.0;

/// Average sentence length (in words) that earns a perfect readability score.
const TARGET_SENTENCE_WORDS: f64 = 15.0;

pub fn assess(text: &str, title: &str, h1_count: usize, h2_count: usize) -> ContentQuality {
    ContentQuality {
        readability_score: readability_score(text),
        keyword_density: keyword_density(text, title),
        heading_structure: h1_count == 1 && h2_count >= 1,
    }
}

/// `clamp(0, 100, 100 - 2 * (avg_sentence_words - 15))`.
pub fn readability_score(text: &str) -> f64 {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    let splitter = SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]+").expect("static regex"));

    let sentences = splitter
        .split(text)
        .filter(|s| s.split_whitespace().next().is_some())
        .count();
    if sentences == 0 {
        return NEUTRAL_READABILITY;
    }

    let words = text.split_whitespace().count() as f64;
    let avg = words / sentences as f64;
    round2((100.0 - 2.0 * (avg - TARGET_SENTENCE_WORDS)).clamp(0.0, 100.0))
}

/// Lowercased whitespace-separated words with punctuation trimmed from both
/// ends. Inner apostrophes and hyphens stay, so "Luigi's" and "wood-fired"
/// are one token each.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Sum over distinct title terms longer than two characters of their share of
/// body words, as a percentage.
pub fn keyword_density(text: &str, title: &str) -> f64 {
    let words: Vec<String> = tokens(text).collect();
    if words.is_empty() {
        return 0.0;
    }

    let mut seen = HashSet::new();
    let terms: Vec<String> = tokens(title)
        .filter(|t| t.chars().count() > 2)
        .filter(|t| seen.insert(t.clone()))
        .collect();

    let total = words.len() as f64;
    let density: f64 = terms
        .iter()
        .map(|term| words.iter().filter(|w| *w == term).count() as f64 / total * 100.0)
        .sum();
    round2(density)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sentences_clamp_to_100() {
        assert_eq!(readability_score("Short one. Another here! Fine?"), 100.0);
    }

    #[test]
    fn long_sentences_lose_two_points_per_extra_word() {
        // one sentence of 25 words: 100 - 2 * (25 - 15) = 80
        let text = vec!["word"; 25].join(" ") + ".";
        assert_eq!(readability_score(&text), 80.0);

        // one sentence of 80 words bottoms out at 0
        let text = vec!["word"; 80].join(" ");
        assert_eq!(readability_score(&text), 0.0);
    }

    #[test]
    fn no_sentences_is_neutral_not_nan() {
        assert_eq!(readability_score(""), NEUTRAL_READABILITY);
        assert_eq!(readability_score(" ... !!! "), NEUTRAL_READABILITY);
    }

    #[test]
    fn density_counts_title_terms_over_total_words() {
        // 11 words, "pasta" twice; "in" is too short to count
        let text = "Fresh pasta in town. We make pasta daily for you here";
        let density = keyword_density(text, "Fresh Pasta in Town");
        // fresh 1/11, pasta 2/11, town 1/11 -> 4/11 * 100
        assert_eq!(density, round2(4.0 / 11.0 * 100.0));
    }

    #[test]
    fn possessive_and_hyphenated_title_terms_match_body_words() {
        // 5 words: "luigi's" once, "wood-fired" once, no "pizza"
        let density = keyword_density("Luigi's wood-fired oven opens tonight!", "Luigi's Wood-Fired Pizza");
        assert_eq!(density, round2(2.0 / 5.0 * 100.0));
    }

    #[test]
    fn tokens_trim_edges_only() {
        let words: Vec<String> = tokens("  \"Luigi's\" space-age, (menu) ... ").collect();
        assert_eq!(words, vec!["luigi's", "space-age", "menu"]);
    }

    #[test]
    fn density_is_zero_without_content() {
        assert_eq!(keyword_density("", "Anything Goes"), 0.0);
        assert_eq!(keyword_density("some words here", ""), 0.0);
    }

    #[test]
    fn repeated_title_terms_count_once() {
        let once = keyword_density("pasta and more", "Pasta");
        let twice = keyword_density("pasta and more", "Pasta pasta");
        assert_eq!(once, twice);
    }

    #[test]
    fn heading_structure_needs_one_h1_and_an_h2() {
        assert!(assess("", "", 1, 2).heading_structure);
        assert!(!assess("", "", 2, 2).heading_structure);
        assert!(!assess("", "", 1, 0).heading_structure);
        assert!(!assess("", "", 0, 3).heading_structure);
    }
}
