use crate::config::OutputFormat;
use crate::error::Result;
use crate::extract::{Extraction, UNTITLED};
use crate::markdown::{normalize_and_convert, plain_text};
use chrono::{DateTime, Local, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAX_SLUG_CHARS: usize = 100;
const PATH_HOSTILE: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub url: String,
    pub title: String,
    pub content_html: String,
    pub markdown: String,
    pub plain_text: String,
    pub crawl_time: DateTime<Local>,
    pub vendor: String,
    pub product: String,
}

impl DocumentRecord {
    /// Converts an extraction into a record. `fallback_title` replaces the
    /// untitled sentinel when the page has no usable heading.
    pub fn from_extraction(
        extraction: Extraction,
        url: &str,
        vendor: &str,
        product: &str,
        fallback_title: Option<&str>,
    ) -> Self {
        let title = match fallback_title {
            Some(fallback) if extraction.title == UNTITLED && !fallback.trim().is_empty() => {
                fallback.trim().to_string()
            }
            _ => extraction.title,
        };

        let markdown = normalize_and_convert(&extraction.content_html);
        let plain_text = plain_text(&extraction.content_html);

        Self {
            url: url.to_string(),
            title,
            content_html: extraction.content_html,
            markdown,
            plain_text,
            crawl_time: Local::now(),
            vendor: vendor.to_string(),
            product: product.to_string(),
        }
    }

    pub fn body(&self, format: OutputFormat) -> &str {
        match format {
            OutputFormat::Md => &self.markdown,
            OutputFormat::Txt => &self.plain_text,
        }
    }
}

/// Filesystem-safe file stem for a document title.
pub fn slugify(title: &str) -> String {
    let slug: String = title
        .chars()
        .filter(|c| !PATH_HOSTILE.contains(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(MAX_SLUG_CHARS)
        .collect();
    let slug = slug.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// `---` delimited metadata block; values are JSON-quoted strings.
pub fn front_matter(record: &DocumentRecord) -> String {
    let fields = [
        ("url", record.url.as_str()),
        ("title", record.title.as_str()),
        ("vendor", record.vendor.as_str()),
        ("product", record.product.as_str()),
    ];

    let mut out = String::from("---\n");
    for (key, value) in fields {
        out.push_str(&format!("{}: {}\n", key, quote(value)));
    }
    let crawl_time = record.crawl_time.to_rfc3339_opts(SecondsFormat::Secs, false);
    out.push_str(&format!("crawl_time: {}\n", quote(&crawl_time)));
    out.push_str("---\n\n");
    out
}

fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Writes document records under `<content_dir>/<vendor>/<product>/`.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    content_dir: PathBuf,
    formats: Vec<OutputFormat>,
}

impl DocumentWriter {
    pub fn new(content_dir: impl Into<PathBuf>, formats: Vec<OutputFormat>) -> Self {
        Self {
            content_dir: content_dir.into(),
            formats,
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// One file per configured format; formats with an empty body are skipped.
    pub fn write(&self, record: &DocumentRecord) -> Result<Vec<PathBuf>> {
        let target_dir = self.content_dir.join(&record.vendor).join(&record.product);
        fs::create_dir_all(&target_dir)?;

        let header = front_matter(record);
        let stem = slugify(&record.title);
        let mut written = Vec::new();

        for format in &self.formats {
            let body = record.body(*format);
            if body.trim().is_empty() {
                debug!("{}: empty {} body, not written", record.url, format.extension());
                continue;
            }
            let path = target_dir.join(format!("{}.{}", stem, format.extension()));
            fs::write(&path, format!("{}{}", header, body))?;
            written.push(path);
        }

        Ok(written)
    }
}
