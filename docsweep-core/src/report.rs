// Run summaries for link harvests and content extraction

use crate::error::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProductOutcome {
    Collected { links: usize, manifest: PathBuf },
    Skipped { reason: String },
    Failed { error: String },
    Extracted { documents: usize, failed: usize },
}

impl ProductOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProductOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
    pub vendor: String,
    pub product: String,
    pub display_name: String,
    pub outcome: ProductOutcome,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestSummary {
    pub started: DateTime<Local>,
    pub products: Vec<ProductReport>,
}

impl Default for HarvestSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestSummary {
    pub fn new() -> Self {
        Self {
            started: Local::now(),
            products: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        vendor: &str,
        product: &str,
        display_name: &str,
        outcome: ProductOutcome,
        duration: Duration,
    ) {
        self.products.push(ProductReport {
            vendor: vendor.to_string(),
            product: product.to_string(),
            display_name: display_name.to_string(),
            outcome,
            duration_secs: duration.as_secs_f64(),
        });
    }

    pub fn merge(&mut self, other: HarvestSummary) {
        self.products.extend(other.products);
    }

    pub fn failed(&self) -> usize {
        self.products.iter().filter(|p| p.outcome.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.products
            .iter()
            .filter(|p| matches!(p.outcome, ProductOutcome::Skipped { .. }))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.products.len() - self.failed() - self.skipped()
    }

    pub fn total_links(&self) -> usize {
        self.products
            .iter()
            .map(|p| match p.outcome {
                ProductOutcome::Collected { links, .. } => links,
                _ => 0,
            })
            .sum()
    }

    pub fn total_documents(&self) -> usize {
        self.products
            .iter()
            .map(|p| match p.outcome {
                ProductOutcome::Extracted { documents, .. } => documents,
                _ => 0,
            })
            .sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Human-readable run summary.
pub fn generate_summary_report(summary: &HarvestSummary) -> String {
    let elapsed: f64 = summary.products.iter().map(|p| p.duration_secs).sum();

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Started: {}\n",
        summary.started.format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("  Products: {}\n", summary.products.len()));
    report.push_str(&format!("  Succeeded: {}\n", summary.succeeded()));
    report.push_str(&format!("  Skipped: {}\n", summary.skipped()));
    report.push_str(&format!("  Failed: {}\n", summary.failed()));
    if summary.total_links() > 0 {
        report.push_str(&format!("  Links collected: {}\n", summary.total_links()));
    }
    if summary.total_documents() > 0 {
        report.push_str(&format!("  Documents extracted: {}\n", summary.total_documents()));
    }
    report.push_str(&format!("  Time: {:.2}s\n", elapsed));
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for product in &summary.products {
        report.push_str(&format!(
            "## {} ({}/{})\n",
            product.display_name, product.vendor, product.product
        ));
        let line = match &product.outcome {
            ProductOutcome::Collected { links, manifest } => {
                format!("  [+] {} links -> {}", links, manifest.display())
            }
            ProductOutcome::Skipped { reason } => format!("  [=] skipped: {}", reason),
            ProductOutcome::Failed { error } => format!("  [!] failed: {}", error),
            ProductOutcome::Extracted { documents, failed } => {
                format!("  [+] {} documents extracted, {} failed", documents, failed)
            }
        };
        report.push_str(&line);
        report.push_str(&format!(" ({:.2}s)\n\n", product.duration_secs));
    }

    report
}
