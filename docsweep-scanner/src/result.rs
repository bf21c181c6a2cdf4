use serde::{Deserialize, Serialize};
use url::Url;

/// A document discovered in a vendor's navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    pub title: String,
}

impl LinkRecord {
    /// Builds a record, normalizing the title. Returns `None` when the title
    /// is empty after normalization.
    pub fn new(url: impl Into<String>, title: &str) -> Option<Self> {
        let title = normalize_title(title);
        if title.is_empty() {
            return None;
        }
        Some(Self {
            url: url.into(),
            title,
        })
    }
}

/// Trims every line of a title and joins the non-empty ones with a single space.
pub fn normalize_title(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical form used for deduplication: scheme + host + port + path, with
/// query string and fragment removed.
pub fn canonical_url(url: &Url) -> String {
    let mut canonical = url.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);
    canonical.to_string()
}
