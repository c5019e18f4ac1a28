//! HTML parser for extracting the title and anchor targets
//!
//! Links are returned exactly as written in the `href` attribute. Resolving,
//! scoping and normalizing them is the coordinator's job.

use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title (from the first <title> tag)
    pub title: Option<String>,

    /// Raw `href` values of every `<a>` tag, in document order
    pub links: Vec<String>,
}

/// Parser seam used by the coordinator
pub trait PageParser: Send + Sync {
    fn parse(&self, html: &str) -> ParsedPage;
}

/// `PageParser` built on `scraper`
#[derive(Debug, Clone, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl PageParser for HtmlParser {
    /// Parses HTML content and extracts the title and links
    ///
    /// The document is dropped before returning, so the result can be held
    /// across await points.
    ///
    /// # Example
    ///
    /// ```
    /// use spider::crawler::{HtmlParser, PageParser};
    ///
    /// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
    /// let parsed = HtmlParser::new().parse(html);
    /// assert_eq!(parsed.title, Some("Test".to_string()));
    /// assert_eq!(parsed.links, vec!["/page".to_string()]);
    /// ```
    fn parse(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);

        ParsedPage {
            title: extract_title(&document),
            links: extract_links(&document),
        }
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

fn extract_links(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
