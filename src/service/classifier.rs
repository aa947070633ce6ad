//! Business and site type detection from vocabulary hits.

use serde_json::Value;

use crate::domain::models::{BusinessType, PageData, SiteType};
use crate::extractor::content_quality::tokens;

/// Weight of a matching JSON-LD `@type` relative to one vocabulary hit.
const STRUCTURED_HINT_WEIGHT: usize = 5;

struct Profile<T> {
    kind: T,
    terms: &'static [&'static str],
    schema_types: &'static [&'static str],
}

const BUSINESS_PROFILES: &[Profile<BusinessType>] = &[
    Profile {
        kind: BusinessType::Restaurant,
        terms: &["restaurant", "menu", "dining", "cuisine", "pizza", "pasta", "cafe", "bistro", "chef", "reservation", "trattoria"],
        schema_types: &["restaurant", "foodestablishment", "cafeorcoffeeshop", "bakery", "menu"],
    },
    Profile {
        kind: BusinessType::Ecommerce,
        terms: &["shop", "cart", "checkout", "buy", "shipping", "product", "store", "sale", "order now"],
        schema_types: &["product", "offer", "store", "onlinestore"],
    },
    Profile {
        kind: BusinessType::Healthcare,
        terms: &["clinic", "doctor", "patient", "medical", "health", "dental", "dentist", "hospital", "therapy"],
        schema_types: &["medicalorganization", "physician", "dentist", "hospital", "medicalclinic"],
    },
    Profile {
        kind: BusinessType::Education,
        terms: &["course", "school", "student", "learn", "university", "academy", "training", "tutor", "enroll"],
        schema_types: &["educationalorganization", "school", "course", "collegeoruniversity"],
    },
    Profile {
        kind: BusinessType::RealEstate,
        terms: &["real estate", "property", "properties", "homes for sale", "apartment", "realtor", "mortgage", "listing"],
        schema_types: &["realestateagent", "residence", "apartment", "house"],
    },
    Profile {
        kind: BusinessType::Technology,
        terms: &["software", "saas", "cloud", "api", "platform", "developer", "app", "startup", "integration"],
        schema_types: &["softwareapplication", "webapplication", "mobileapplication"],
    },
    Profile {
        kind: BusinessType::Beauty,
        terms: &["salon", "beauty", "spa", "hair", "nail", "makeup", "skincare", "massage", "cosmetic"],
        schema_types: &["beautysalon", "hairsalon", "dayspa", "nailsalon", "healthandbeautybusiness"],
    },
    Profile {
        kind: BusinessType::Legal,
        terms: &["lawyer", "attorney", "law firm", "legal", "litigation", "solicitor", "counsel"],
        schema_types: &["legalservice", "attorney", "notary"],
    },
];

const SITE_PROFILES: &[Profile<SiteType>] = &[
    Profile {
        kind: SiteType::Ecommerce,
        terms: &["add to cart", "checkout", "shopping cart", "free shipping", "in stock"],
        schema_types: &["product", "offer", "onlinestore"],
    },
    Profile {
        kind: SiteType::Blog,
        terms: &["blog", "posted on", "read more", "comments", "latest posts", "author"],
        schema_types: &["blogposting", "blog", "article", "newsarticle"],
    },
    Profile {
        kind: SiteType::Portfolio,
        terms: &["portfolio", "my work", "case study", "projects", "gallery", "hire me"],
        schema_types: &["creativework", "visualartwork", "person"],
    },
    Profile {
        kind: SiteType::LandingPage,
        terms: &["sign up", "get started", "free trial", "subscribe", "limited offer", "book a demo"],
        schema_types: &[],
    },
    Profile {
        kind: SiteType::Corporate,
        terms: &["about us", "our team", "careers", "contact us", "our services", "company"],
        schema_types: &["organization", "corporation", "localbusiness"],
    },
];

/// Detect the business category and, when the evidence allows, the site type.
pub fn classify(page: &PageData) -> (BusinessType, Option<SiteType>) {
    let corpus: Vec<String> = tokens(&corpus(page)).collect();
    let schema_types = schema_types(&page.structured_data);

    let business = best_match(BUSINESS_PROFILES, &corpus, &schema_types).unwrap_or(BusinessType::Other);
    let site = best_match(SITE_PROFILES, &corpus, &schema_types);

    tracing::debug!("[ANALYZE] Classified page as {:?} / {:?}", business, site);
    (business, site)
}

/// Highest-scoring profile; ties go to the earlier entry, zero hits to `None`.
fn best_match<T: Copy>(profiles: &[Profile<T>], corpus: &[String], schema_types: &[String]) -> Option<T> {
    let mut best: Option<(usize, T)> = None;
    for profile in profiles {
        let hits = score(profile, corpus, schema_types);
        if hits > 0 && best.map_or(true, |(top, _)| hits > top) {
            best = Some((hits, profile.kind));
        }
    }
    best.map(|(_, kind)| kind)
}

fn score<T>(profile: &Profile<T>, corpus: &[String], schema_types: &[String]) -> usize {
    let vocabulary: usize = profile.terms.iter().map(|term| occurrences(term, corpus)).sum();
    let hints = schema_types
        .iter()
        .filter(|t| profile.schema_types.contains(&t.as_str()))
        .count();
    vocabulary + hints * STRUCTURED_HINT_WEIGHT
}

/// Whole-word hits of `term` in the token stream; multi-word terms must
/// appear as consecutive tokens.
fn occurrences(term: &str, corpus: &[String]) -> usize {
    let words: Vec<&str> = term.split_whitespace().collect();
    if words.is_empty() {
        return 0;
    }
    corpus
        .windows(words.len())
        .filter(|window| window.iter().zip(&words).all(|(token, word)| token == word))
        .count()
}

fn corpus(page: &PageData) -> String {
    let mut parts = vec![page.title.as_str(), page.description.as_str()];
    parts.extend(page.h1_tags.iter().map(String::as_str));
    parts.extend(page.h2_tags.iter().map(String::as_str));
    parts.extend(page.keywords.iter().map(String::as_str));
    parts.push(page.text_excerpt.as_str());
    parts.join(" ")
}

/// Lowercased `@type` values, including those nested in `@graph`.
fn schema_types(structured: &[Value]) -> Vec<String> {
    let mut types = Vec::new();
    for value in structured {
        collect_types(value, &mut types);
    }
    types
}

fn collect_types(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_types(v, out)),
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(t)) => out.push(t.to_lowercase()),
                Some(Value::Array(ts)) => out.extend(ts.iter().filter_map(Value::as_str).map(str::to_lowercase)),
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_types(graph, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::empty_page;
    use serde_json::json;

    #[test]
    fn empty_page_is_other_without_site_type() {
        assert_eq!(classify(&empty_page()), (BusinessType::Other, None));
    }

    #[test]
    fn vocabulary_drives_business_type() {
        let page = PageData {
            title: "Smile Dental Clinic".into(),
            description: "Your family dentist for check-ups and whitening.".into(),
            ..empty_page()
        };
        assert_eq!(classify(&page).0, BusinessType::Healthcare);
    }

    #[test]
    fn structured_data_outweighs_stray_terms() {
        let page = PageData {
            title: "Handmade menu boards".into(),
            structured_data: vec![json!({"@context": "https://schema.org", "@graph": [{"@type": ["Product", "Thing"]}]})],
            ..empty_page()
        };
        let (business, site) = classify(&page);
        assert_eq!(business, BusinessType::Ecommerce);
        assert_eq!(site, Some(SiteType::Ecommerce));
    }

    #[test]
    fn ties_resolve_by_table_order() {
        let page = PageData {
            title: "menu shop".into(),
            ..empty_page()
        };
        assert_eq!(classify(&page).0, BusinessType::Restaurant);
    }

    #[test]
    fn everyday_words_do_not_trigger_other_vocabularies() {
        // "happy", "apple" and "appetizers" contain "app"; "spanish" and "space-age" contain "spa"
        let page = PageData {
            title: "Trattoria Roma restaurant".into(),
            text_excerpt: "We are happy to serve apple tarts, spanish appetizers and space-age cocktails at our happy hour."
                .into(),
            ..empty_page()
        };
        assert_eq!(classify(&page).0, BusinessType::Restaurant);
    }

    #[test]
    fn phrases_match_across_punctuation_only_as_whole_words() {
        let corpus: Vec<String> = tokens("Homes for sale! Wholesale homes, for sale.").collect();
        assert_eq!(occurrences("homes for sale", &corpus), 2);
        assert_eq!(occurrences("sale", &corpus), 2);
        assert_eq!(occurrences("", &corpus), 0);
    }

    #[test]
    fn blog_site_type() {
        let page = PageData {
            title: "Notes from the kitchen - a blog".into(),
            h2_tags: vec!["Latest posts".into()],
            ..empty_page()
        };
        assert_eq!(classify(&page).1, Some(SiteType::Blog));
    }
}
