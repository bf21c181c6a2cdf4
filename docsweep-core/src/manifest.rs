//! Human-readable link manifests: writer, parser and on-disk lookup.
//!
//! Layout:
//!
//! ```text
//! Elastic Compute Service documentation links
//! ==================================================
//! Product: Elastic Compute Service
//! Description: Scalable virtual servers
//! Start URL: https://help.aliyun.com/zh/ecs/
//! Generated: 20250101_120000
//! Documents: 2
//! ==================================================
//!
//!   1. What is ECS
//!      https://help.aliyun.com/zh/ecs/what-is-ecs
//!
//!   2. Instance families
//!      https://help.aliyun.com/zh/ecs/instance-families
//! ```

use crate::config::ProductUnit;
use crate::error::Result;
use chrono::{DateTime, Local};
use docsweep_scanner::LinkRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const DIVIDER_WIDTH: usize = 50;
const LINKS_MARKER: &str = "_links_";

/// JSON companion of a text manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub vendor: String,
    pub product: ProductUnit,
    pub generated: String,
    pub links: Vec<LinkRecord>,
}

fn divider() -> String {
    "=".repeat(DIVIDER_WIDTH)
}

pub fn render_manifest(product: &ProductUnit, links: &[LinkRecord], generated: &DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} documentation links\n", product.display_name));
    out.push_str(&divider());
    out.push('\n');
    out.push_str(&format!("Product: {}\n", product.display_name));
    out.push_str(&format!("Description: {}\n", product.description));
    out.push_str(&format!("Start URL: {}\n", product.start_url));
    out.push_str(&format!("Generated: {}\n", generated.format(TIMESTAMP_FORMAT)));
    out.push_str(&format!("Documents: {}\n", links.len()));
    out.push_str(&divider());
    out.push_str("\n\n");

    for (index, link) in links.iter().enumerate() {
        out.push_str(&format!("{:>3}. {}\n", index + 1, link.title));
        out.push_str(&format!("     {}\n\n", link.url));
    }
    out
}

/// Recovers `{title, url}` records from manifest text.
///
/// Parsing starts two lines past the first divider (or at the top when there
/// is none). A numbered line opens a title, following non-URL lines extend it,
/// and the next `http(s)://` line closes the record.
pub fn parse_manifest(text: &str) -> Vec<LinkRecord> {
    let lines: Vec<&str> = text.lines().collect();
    let divider = divider();
    let start = lines
        .iter()
        .position(|line| line.trim_end() == divider)
        .map(|index| index + 2)
        .unwrap_or(0);

    let mut records = Vec::new();
    let mut current: Option<String> = None;

    for line in lines.iter().skip(start) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(title) = numbered_title(line) {
            current = Some(title.to_string());
        } else if line.starts_with("https://") || line.starts_with("http://") {
            if let Some(title) = current.take()
                && let Some(record) = LinkRecord::new(line, &title)
            {
                records.push(record);
            }
        } else if let Some(ref mut title) = current {
            title.push(' ');
            title.push_str(line);
        }
    }

    records
}

/// `"12. Title"` -> `"Title"`.
fn numbered_title(line: &str) -> Option<&str> {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix('.').map(str::trim)
}

pub fn read_manifest(path: &Path) -> Result<Vec<LinkRecord>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_manifest(&text))
}

pub fn manifest_file_name(vendor: &str, product: &str, generated: &DateTime<Local>) -> String {
    format!(
        "{}_{}{}{}.txt",
        vendor,
        product,
        LINKS_MARKER,
        generated.format(TIMESTAMP_FORMAT)
    )
}

/// Writes `<links_dir>/<vendor>/<vendor>_<product>_links_<ts>.txt`, plus a
/// `.json` twin when `with_json` is set. Returns the text manifest path.
pub fn write_manifest(
    links_dir: &Path,
    vendor: &str,
    product: &ProductUnit,
    links: &[LinkRecord],
    with_json: bool,
) -> Result<PathBuf> {
    let generated = Local::now();
    let vendor_dir = links_dir.join(vendor);
    fs::create_dir_all(&vendor_dir)?;

    let path = vendor_dir.join(manifest_file_name(vendor, &product.key, &generated));
    fs::write(&path, render_manifest(product, links, &generated))?;
    debug!("Wrote {} links to {}", links.len(), path.display());

    if with_json {
        let document = ManifestDocument {
            vendor: vendor.to_string(),
            product: product.clone(),
            generated: generated.format(TIMESTAMP_FORMAT).to_string(),
            links: links.to_vec(),
        };
        let json_path = path.with_extension("json");
        fs::write(&json_path, serde_json::to_string_pretty(&document)?)?;
        debug!("Wrote JSON manifest {}", json_path.display());
    }

    Ok(path)
}

/// Product key encoded in a manifest file name, if the name belongs to `vendor`.
pub fn manifest_product_key(path: &Path, vendor: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(".txt")?;
    let rest = stem.strip_prefix(vendor)?.strip_prefix('_')?;
    let (product, timestamp) = rest.rsplit_once(LINKS_MARKER)?;

    let well_formed = timestamp.len() == 15
        && timestamp
            .char_indices()
            .all(|(i, c)| if i == 8 { c == '_' } else { c.is_ascii_digit() });
    if product.is_empty() || !well_formed {
        return None;
    }
    Some(product.to_string())
}

/// Manifests under `<links_dir>/<vendor>`, oldest first, optionally for one product.
pub fn find_manifests(links_dir: &Path, vendor: &str, product: Option<&str>) -> Result<Vec<PathBuf>> {
    let vendor_dir = links_dir.join(vendor);
    if !vendor_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut manifests = Vec::new();
    for entry in fs::read_dir(&vendor_dir)? {
        let path = entry?.path();
        let Some(key) = manifest_product_key(&path, vendor) else {
            continue;
        };
        if product.is_none_or(|wanted| wanted == key) {
            manifests.push(path);
        }
    }

    manifests.sort();
    Ok(manifests)
}

/// Newest manifest per product, in product key order.
pub fn latest_manifests(links_dir: &Path, vendor: &str, product: Option<&str>) -> Result<Vec<(String, PathBuf)>> {
    let mut latest: std::collections::BTreeMap<String, PathBuf> = std::collections::BTreeMap::new();
    for path in find_manifests(links_dir, vendor, product)? {
        if let Some(key) = manifest_product_key(&path, vendor) {
            // Sorted input: later timestamps overwrite earlier ones
            latest.insert(key, path);
        }
    }
    Ok(latest.into_iter().collect())
}
