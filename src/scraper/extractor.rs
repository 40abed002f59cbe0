use std::collections::HashSet;
use std::io::Cursor;

use ::scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{ExtractionMethod, ScrapedData};
use crate::scraper::ScraperConfig;

/// Readability output shorter than this (in chars) falls back to selectors
pub const MIN_PRIMARY_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_DESCRIPTION_CHARS: usize = 500;
/// Description taken from the head of the content or first paragraph
pub const DESCRIPTION_SNIPPET_CHARS: usize = 300;
/// Cap for the joined-paragraphs content fallback
pub const PARAGRAPH_FALLBACK_CHARS: usize = 1000;

pub const NO_TITLE: &str = "No title found";
pub const NO_DESCRIPTION: &str = "No description found";
pub const NO_CONTENT: &str = "No content found";

/// Main article as isolated by the readability pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub data: ScrapedData,
    pub method: ExtractionMethod,
}

/// Turns final HTML into a `{title, description, content}` record
pub struct ContentExtractor {
    content_selectors: Vec<(String, Selector)>,
    remove_selectors: Vec<Selector>,
}

impl ContentExtractor {
    pub fn new(config: &ScraperConfig) -> Self {
        let content_selectors = config
            .content_selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(sel) => Some((s.clone(), sel)),
                Err(e) => {
                    warn!("Skipping invalid content selector '{}': {:?}", s, e);
                    None
                }
            })
            .collect();

        let remove_selectors = config
            .remove_selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(sel) => Some(sel),
                Err(e) => {
                    warn!("Skipping invalid remove selector '{}': {:?}", s, e);
                    None
                }
            })
            .collect();

        Self {
            content_selectors,
            remove_selectors,
        }
    }

    pub fn extract(&self, html: &str, url: &str) -> Extraction {
        let primary = readable(html, url);
        self.finish(primary, html, url)
    }

    /// Pick between the readability result and the selector fallback, then
    /// apply placeholders and length caps.
    pub fn finish(&self, primary: Option<ExtractionResult>, html: &str, url: &str) -> Extraction {
        let document = Html::parse_document(html);
        let page_title = title_chain(&document);

        let primary = primary.filter(|r| r.content.trim().chars().count() > MIN_PRIMARY_CHARS);

        let (title, description, content, method) = match primary {
            Some(result) => {
                info!("Using readability extraction");
                let title = non_empty(&result.title).unwrap_or(page_title);
                let content = truncate_chars(result.content.trim(), MAX_CONTENT_CHARS);
                let description = non_empty(&result.excerpt)
                    .or_else(|| meta_content(&document, "name", "description"))
                    .or_else(|| meta_content(&document, "property", "og:description"))
                    .unwrap_or_else(|| truncate_chars(&content, DESCRIPTION_SNIPPET_CHARS));
                (title, description, content, ExtractionMethod::Readability)
            }
            None => {
                info!("Using fallback content extraction");
                let description = meta_content(&document, "name", "description")
                    .or_else(|| meta_content(&document, "property", "og:description"))
                    .or_else(|| meta_content(&document, "name", "twitter:description"))
                    .or_else(|| first_paragraph(&document))
                    .unwrap_or_else(|| NO_DESCRIPTION.to_string());
                let content = self.fallback_content(&document);
                (page_title, description, content, ExtractionMethod::Fallback)
            }
        };

        Extraction {
            data: ScrapedData {
                url: url.to_string(),
                title,
                description: truncate_chars(&description, MAX_DESCRIPTION_CHARS),
                content,
            },
            method,
        }
    }

    fn fallback_content(&self, document: &Html) -> String {
        let mut content = None;

        for (name, selector) in &self.content_selectors {
            let Some(element) = document.select(selector).next() else {
                continue;
            };
            let text = self.visible_text(element);
            let len = text.trim().chars().count();
            if len > MIN_PRIMARY_CHARS {
                debug!("Content selector '{}' matched {} chars", name, len);
                content = Some(text);
                break;
            }
        }

        let content = content.unwrap_or_else(|| {
            debug!("No content selector qualified, joining paragraphs");
            let paragraphs: Vec<String> = select_all(document, "p")
                .map(|p| p.text().collect::<String>().trim().to_string())
                .collect();
            truncate_chars(&paragraphs.join(" "), PARAGRAPH_FALLBACK_CHARS)
        });

        let content = truncate_chars(&collapse_whitespace(&content), MAX_CONTENT_CHARS);
        if content.is_empty() {
            NO_CONTENT.to_string()
        } else {
            content
        }
    }

    /// Text of `element`, skipping anything under a remove selector
    fn visible_text(&self, element: ElementRef<'_>) -> String {
        let removed: HashSet<_> = self
            .remove_selectors
            .iter()
            .flat_map(|sel| element.select(sel).map(|e| e.id()))
            .collect();

        element
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let hidden = node.ancestors().any(|a| removed.contains(&a.id()));
                (!hidden).then(|| text.to_string())
            })
            .collect()
    }
}

/// `<title>`, then the first `<h1>`, then `og:title`.
pub fn page_title(html: &str) -> String {
    title_chain(&Html::parse_document(html))
}

fn title_chain(document: &Html) -> String {
    first_text(document, "title")
        .or_else(|| first_text(document, "h1"))
        .or_else(|| meta_content(document, "property", "og:title"))
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn readable(html: &str, url: &str) -> Option<ExtractionResult> {
    let url = match Url::parse(url) {
        Ok(url) => url,
        Err(e) => {
            debug!("Readability skipped, unparseable URL '{}': {}", url, e);
            return None;
        }
    };

    let mut cursor = Cursor::new(html.as_bytes());
    let product = match readability::extractor::extract(&mut cursor, &url) {
        Ok(product) => product,
        Err(e) => {
            debug!("Readability failed: {:?}", e);
            return None;
        }
    };

    let excerpt = first_paragraph(&Html::parse_fragment(&product.content)).unwrap_or_default();

    Some(ExtractionResult {
        title: product.title,
        content: product.text,
        excerpt,
    })
}

fn select_all<'a>(document: &'a Html, selector: &str) -> impl Iterator<Item = ElementRef<'a>> {
    let selector = Selector::parse(selector).ok();
    selector
        .into_iter()
        .flat_map(move |sel| document.select(&sel).collect::<Vec<_>>())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let element = select_all(document, selector).next()?;
    non_empty(&element.text().collect::<String>())
}

fn first_paragraph(document: &Html) -> Option<String> {
    select_all(document, "p")
        .map(|p| p.text().collect::<String>())
        .find_map(|text| non_empty(&text))
        .map(|text| truncate_chars(&text, DESCRIPTION_SNIPPET_CHARS))
}

fn meta_content(document: &Html, attr: &str, key: &str) -> Option<String> {
    let selector = format!(r#"meta[{}="{}"]"#, attr, key);
    select_all(document, &selector)
        .filter_map(|m| m.value().attr("content"))
        .find_map(non_empty)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
