//! Fetched documents and link extraction
//!
//! This module handles querying fetched HTML for:
//! - Website links in a profile's bio fields
//! - Feed `<link>` elements advertised by a website

use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// A fetched page, ready to be queried
///
/// The HTML is kept as text and parsed for each query, so a document can be
/// shared between threads and held across suspension points.
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    html: String,
}

/// An element matched by a query, with its attributes copied out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    base: Url,
    attributes: Vec<(String, String)>,
}

impl Document {
    /// Creates a document from its final URL and HTML content
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// URL the document was loaded from, after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Returns every element matching a CSS selector, in document order
    ///
    /// # Example
    ///
    /// ```
    /// use feedhop::crawler::Document;
    /// use url::Url;
    ///
    /// let doc = Document::new(
    ///     Url::parse("https://a-site.test/blog/").unwrap(),
    ///     r#"<a class="home" href="/">Home</a>"#,
    /// );
    /// let links = doc.query_all("a.home").unwrap();
    /// assert_eq!(links[0].href().as_deref(), Some("https://a-site.test/"));
    /// ```
    pub fn query_all(&self, selector: &str) -> Result<Vec<Element>, ParseError> {
        let parsed = Selector::parse(selector).map_err(|e| ParseError::Selector {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        let document = Html::parse_document(&self.html);

        let elements = document
            .select(&parsed)
            .map(|element| Element {
                base: self.url.clone(),
                attributes: element
                    .value()
                    .attrs()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            })
            .collect();

        Ok(elements)
    }
}

impl Element {
    /// Raw value of an attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `href` attribute resolved against the document URL
    ///
    /// Returns `None` when there is no followable http(s) target.
    pub fn href(&self) -> Option<String> {
        self.attr("href")
            .and_then(|href| resolve_link(href, &self.base))
    }
}

/// Extracts website links from a profile page, in document order
pub fn extract_profile_links(
    document: &Document,
    selector: &str,
) -> Result<Vec<String>, ParseError> {
    let links = document
        .query_all(selector)?
        .iter()
        .filter_map(Element::href)
        .collect();

    Ok(links)
}

/// Extracts feed URLs from a website, in document order
///
/// Only elements whose `rel` contains `alternate` and whose `type` is one of
/// `feed_types` are kept. Repeated feed URLs are reported once.
pub fn extract_feed_links(
    document: &Document,
    selector: &str,
    feed_types: &[String],
) -> Result<Vec<String>, ParseError> {
    let mut feeds: Vec<String> = Vec::new();

    for element in document.query_all(selector)? {
        let is_alternate = element.attr("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("alternate"))
        });
        if !is_alternate {
            continue;
        }

        let is_feed = element.attr("type").is_some_and(|mime| {
            let mime = mime.split(';').next().unwrap_or(mime).trim();
            feed_types.iter().any(|t| t.eq_ignore_ascii_case(mime))
        });
        if !is_feed {
            continue;
        }

        if let Some(href) = element.href() {
            if !feeds.contains(&href) {
                feeds.push(href);
            }
        }
    }

    Ok(feeds)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Absolute hrefs are returned as written (trimmed), relative ones are
/// joined onto `base_url`.
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    // Absolute links are kept as written; only relative ones are rewritten
    if let Ok(absolute_url) = Url::parse(href) {
        return is_http(&absolute_url).then(|| href.to_string());
    }

    let resolved = base_url.join(href).ok()?;
    is_http(&resolved).then(|| resolved.to_string())
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
