use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

use super::content_quality;
use crate::domain::models::{ImageElement, LinkElement, OgTags, PageData};

/// Maximum number of characters kept in `PageData::text_excerpt`.
pub const EXCERPT_LIMIT: usize = 2_000;

const HIDDEN_TEXT_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

fn selector(cell: &'static OnceLock<Selector>, css: &'static str) -> &'static Selector {
    cell.get_or_init(|| Selector::parse(css).expect("static selector"))
}

pub struct PageExtractor;

impl PageExtractor {
    /// Parse `html` fetched from `source_url` into a [`PageData`].
    ///
    /// Malformed markup degrades to defaults, never to an error.
    pub fn extract(html: &str, source_url: &str) -> PageData {
        let document = Html::parse_document(html);

        let title = Self::extract_title(&document);
        let h1_tags = Self::extract_headings(&document, 1);
        let h2_tags = Self::extract_headings(&document, 2);
        let text = Self::extract_visible_text(&document);
        let word_count = text.split_whitespace().count();

        let content_quality = content_quality::assess(&text, &title, h1_tags.len(), h2_tags.len());

        PageData {
            description: Self::extract_meta(&document, "description"),
            keywords: Self::extract_keywords(&document),
            images: Self::extract_images(&document, source_url),
            links: Self::extract_links(&document, source_url),
            lang: Self::extract_lang(&document),
            charset: Self::extract_charset(&document),
            viewport: Self::extract_meta(&document, "viewport"),
            canonical_url: Self::extract_canonical(&document),
            og_tags: Self::extract_og_tags(&document),
            structured_data: Self::extract_structured_data(&document),
            text_excerpt: excerpt(&text, EXCERPT_LIMIT),
            title,
            h1_tags,
            h2_tags,
            word_count,
            content_quality,
        }
    }

    pub fn extract_title(html: &Html) -> String {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        html.select(selector(&SELECTOR, "title"))
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default()
    }

    /// First `meta[name=...]` content, matched case-insensitively on the name.
    pub fn extract_meta(html: &Html, name: &str) -> String {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        html.select(selector(&SELECTOR, "meta[name]"))
            .find(|el| {
                el.value()
                    .attr("name")
                    .map(|n| n.trim().eq_ignore_ascii_case(name))
                    .unwrap_or(false)
            })
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    pub fn extract_keywords(html: &Html) -> Vec<String> {
        Self::extract_meta(html, "keywords")
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }

    pub fn extract_lang(html: &Html) -> String {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        html.select(selector(&SELECTOR, "html[lang]"))
            .next()
            .and_then(|el| el.value().attr("lang"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    pub fn extract_charset(html: &Html) -> String {
        static CHARSET: OnceLock<Selector> = OnceLock::new();
        static HTTP_EQUIV: OnceLock<Selector> = OnceLock::new();

        if let Some(charset) = html
            .select(selector(&CHARSET, "meta[charset]"))
            .next()
            .and_then(|el| el.value().attr("charset"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            return charset;
        }

        html.select(selector(&HTTP_EQUIV, "meta[http-equiv]"))
            .find(|el| {
                el.value()
                    .attr("http-equiv")
                    .map(|v| v.trim().eq_ignore_ascii_case("content-type"))
                    .unwrap_or(false)
            })
            .and_then(|el| el.value().attr("content"))
            .and_then(|content| {
                content.split(';').find_map(|part| {
                    let (key, value) = part.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("charset")
                        .then(|| value.trim().trim_matches('"').to_string())
                })
            })
            .unwrap_or_default()
    }

    pub fn extract_canonical(html: &Html) -> String {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        html.select(selector(&SELECTOR, "link[rel='canonical']"))
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }

    pub fn extract_og_tags(html: &Html) -> OgTags {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let mut tags = OgTags::default();

        for el in html.select(selector(&SELECTOR, "meta[property]")) {
            let Some(property) = el.value().attr("property") else {
                continue;
            };
            let content = el.value().attr("content").unwrap_or("").trim();
            let slot = match property.trim().to_ascii_lowercase().as_str() {
                "og:title" => &mut tags.title,
                "og:description" => &mut tags.description,
                "og:image" => &mut tags.image,
                "og:url" => &mut tags.url,
                _ => continue,
            };
            // first match wins
            if slot.is_empty() {
                *slot = content.to_string();
            }
        }

        tags
    }

    pub fn extract_headings(html: &Html, level: u8) -> Vec<String> {
        static H1: OnceLock<Selector> = OnceLock::new();
        static H2: OnceLock<Selector> = OnceLock::new();
        let sel = match level {
            1 => selector(&H1, "h1"),
            2 => selector(&H2, "h2"),
            _ => return Vec::new(),
        };

        html.select(sel)
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect()
    }

    pub fn extract_images(html: &Html, base_url: &str) -> Vec<ImageElement> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let base = Url::parse(base_url).ok();

        html.select(selector(&SELECTOR, "img"))
            .map(|element| {
                let src = element.value().attr("src").unwrap_or("").trim();
                let resolved_src = match (&base, src.is_empty()) {
                    (Some(base), false) => base.join(src).map(|u| u.to_string()).unwrap_or_else(|_| src.to_string()),
                    _ => src.to_string(),
                };

                ImageElement {
                    src: resolved_src,
                    alt: element.value().attr("alt").unwrap_or("").trim().to_string(),
                    title: element.value().attr("title").unwrap_or("").trim().to_string(),
                }
            })
            .collect()
    }

    pub fn extract_links(html: &Html, base_url: &str) -> Vec<LinkElement> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        static IMG_SELECTOR: OnceLock<Selector> = OnceLock::new();
        let img_selector = selector(&IMG_SELECTOR, "img");

        let base = Url::parse(base_url).ok();
        let base_host = base.as_ref().and_then(|u| u.host_str()).map(|h| h.to_ascii_lowercase());

        let mut links = Vec::new();

        for element in html.select(selector(&SELECTOR, "a[href]")) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href = href.trim();

            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            let resolved = match &base {
                Some(base) => base.join(href).map(|u| u.to_string()).unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };

            let link_host = Url::parse(&resolved)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));
            let is_external = link_host != base_host;

            links.push(LinkElement {
                href: resolved,
                text: anchor_text(&element, img_selector),
                is_external,
            });
        }

        links
    }

    pub fn extract_structured_data(html: &Html) -> Vec<serde_json::Value> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        html.select(selector(&SELECTOR, "script[type]"))
            .filter(|el| {
                el.value()
                    .attr("type")
                    .map(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
                    .unwrap_or(false)
            })
            .filter_map(|el| {
                let raw = el.text().collect::<String>();
                match serde_json::from_str::<serde_json::Value>(raw.trim()) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::debug!("[EXTRACT] Skipping malformed JSON-LD block: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Visible body text with script/style contents removed, whitespace normalized.
    pub fn extract_visible_text(html: &Html) -> String {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let root = html
            .select(selector(&SELECTOR, "body"))
            .next()
            .unwrap_or_else(|| html.root_element());

        let mut parts: Vec<&str> = Vec::new();
        for node in root.descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| HIDDEN_TEXT_TAGS.contains(&el.name()))
                    .unwrap_or(false)
            });
            if !hidden {
                parts.push(text);
            }
        }

        normalize_whitespace(&parts.join(" "))
    }
}

/// Visible/accessible text for an anchor (fallbacks: aria-label, title, img alt).
fn anchor_text(element: &ElementRef<'_>, img_selector: &Selector) -> String {
    let text = normalize_whitespace(&element.text().collect::<String>());
    if !text.is_empty() {
        return text;
    }
    if let Some(attr) = element
        .value()
        .attr("aria-label")
        .or_else(|| element.value().attr("title"))
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        return attr.to_string();
    }
    element
        .select(img_selector)
        .filter_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .find(|alt| !alt.is_empty())
        .unwrap_or("")
        .to_string()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `limit` characters of `text`, cut on a char boundary.
pub fn excerpt(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
