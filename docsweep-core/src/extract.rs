//! Vendor-polymorphic article extraction.

use crate::html::{self, Rewrite};
use docsweep_scanner::result::normalize_title;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

pub const UNTITLED: &str = "Untitled";

const BOILERPLATE_TAGS: &[&str] = &["nav", "header", "footer", "script", "style", "aside", "form"];

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").expect("valid selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub title: String,
    /// Cleaned content region with root-relative links made absolute.
    pub content_html: String,
}

pub trait ContentExtractor: Send + Sync {
    fn vendor(&self) -> &str;

    /// Text of the first `<h1>`, or [`UNTITLED`].
    fn extract_title(&self, document: &Html) -> String {
        document
            .select(&H1)
            .next()
            .map(|h1| normalize_title(&h1.text().collect::<String>()))
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Vendor article container; `None` falls back to the cleaned `<body>`.
    fn content_region<'a>(&self, _document: &'a Html) -> Option<ElementRef<'a>> {
        None
    }

    fn extract(&self, page_html: &str, page_url: &Url) -> Extraction {
        let document = Html::parse_document(page_html);
        let title = self.extract_title(&document);

        let mut cleaner = ContentCleaner { page_url };
        let mut content_html = String::new();
        match self.content_region(&document) {
            Some(region) => html::write_element_with(region, &mut content_html, &mut cleaner),
            None => {
                let root = document
                    .select(&BODY)
                    .next()
                    .unwrap_or_else(|| document.root_element());
                html::write_children(root, &mut content_html, &mut cleaner);
            }
        }

        Extraction {
            title,
            content_html,
        }
    }
}

/// Drops boilerplate elements and rewrites root-relative `a[href]` and `img[src]`.
struct ContentCleaner<'a> {
    page_url: &'a Url,
}

impl Rewrite for ContentCleaner<'_> {
    fn element(&mut self, element: ElementRef<'_>, _out: &mut String) -> bool {
        BOILERPLATE_TAGS.contains(&element.value().name())
    }

    fn attribute(&self, element: &str, name: &str, value: &str) -> Option<String> {
        let rewritable = matches!((element, name), ("a", "href") | ("img", "src"));
        if !rewritable || !value.starts_with('/') {
            return None;
        }
        self.page_url.join(value).ok().map(String::from)
    }
}

pub struct DefaultExtractor;

impl ContentExtractor for DefaultExtractor {
    fn vendor(&self) -> &str {
        "default"
    }
}

/// Picks the first element matching a vendor container selector.
pub struct SelectorExtractor {
    vendor: &'static str,
    container: Selector,
}

impl SelectorExtractor {
    pub fn new(vendor: &'static str, container: &str) -> Option<Self> {
        Some(Self {
            vendor,
            container: Selector::parse(container).ok()?,
        })
    }
}

impl ContentExtractor for SelectorExtractor {
    fn vendor(&self) -> &str {
        self.vendor
    }

    fn content_region<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.container).next()
    }
}

const VENDOR_CONTAINERS: &[(&str, &str)] = &[
    ("tencentcloud", "#docArticleContent"),
    ("aliyun", ".content-body"),
    ("huaweicloud", ".content-body"),
    ("volcengine", ".markdown-body"),
];

/// Extractor for a vendor key (case-insensitive); unknown vendors get [`DefaultExtractor`].
pub fn extractor_for(vendor: &str) -> Box<dyn ContentExtractor> {
    let vendor = vendor.to_lowercase();
    VENDOR_CONTAINERS
        .iter()
        .find(|(key, _)| *key == vendor)
        .and_then(|&(key, container)| SelectorExtractor::new(key, container))
        .map(|extractor| Box::new(extractor) as Box<dyn ContentExtractor>)
        .unwrap_or_else(|| Box::new(DefaultExtractor))
}
