//! TOML configuration: run-wide defaults plus one section per vendor.
//!
//! Every setting a vendor section leaves unset is inherited from `[defaults]`,
//! and anything `[defaults]` leaves unset falls back to a built-in value.

use crate::error::{HarvestError, Result};
use docsweep_scanner::{ChromeOptions, SettleOptions, VendorAdapter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bundled configuration written by `docsweep init`.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/docsweep/config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Md,
    Txt,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Md => "md",
            OutputFormat::Txt => "txt",
        }
    }
}

/// How article pages are retrieved during content extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    Browser,
    Http,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CrawlerOverrides {
    pub headless: Option<bool>,
    pub debug: Option<bool>,
    pub wait_timeout_ms: Option<u64>,
    pub click_timeout_ms: Option<u64>,
    pub click_pause_ms: Option<u64>,
    pub settle_quiet_ms: Option<u64>,
    pub settle_max_ms: Option<u64>,
    pub product_timeout_secs: Option<u64>,
    pub crawl_delay_ms: Option<u64>,
}

impl CrawlerOverrides {
    fn or(&self, fallback: &CrawlerOverrides) -> CrawlerOverrides {
        CrawlerOverrides {
            headless: self.headless.or(fallback.headless),
            debug: self.debug.or(fallback.debug),
            wait_timeout_ms: self.wait_timeout_ms.or(fallback.wait_timeout_ms),
            click_timeout_ms: self.click_timeout_ms.or(fallback.click_timeout_ms),
            click_pause_ms: self.click_pause_ms.or(fallback.click_pause_ms),
            settle_quiet_ms: self.settle_quiet_ms.or(fallback.settle_quiet_ms),
            settle_max_ms: self.settle_max_ms.or(fallback.settle_max_ms),
            product_timeout_secs: self.product_timeout_secs.or(fallback.product_timeout_secs),
            crawl_delay_ms: self.crawl_delay_ms.or(fallback.crawl_delay_ms),
        }
    }

    fn resolve(&self) -> CrawlerSettings {
        let builtin = CrawlerSettings::default();
        CrawlerSettings {
            headless: self.headless.unwrap_or(builtin.headless),
            debug: self.debug.unwrap_or(builtin.debug),
            wait_timeout_ms: self.wait_timeout_ms.unwrap_or(builtin.wait_timeout_ms),
            click_timeout_ms: self.click_timeout_ms.unwrap_or(builtin.click_timeout_ms),
            click_pause_ms: self.click_pause_ms.unwrap_or(builtin.click_pause_ms),
            settle_quiet_ms: self.settle_quiet_ms.unwrap_or(builtin.settle_quiet_ms),
            settle_max_ms: self.settle_max_ms.unwrap_or(builtin.settle_max_ms),
            product_timeout_secs: self
                .product_timeout_secs
                .unwrap_or(builtin.product_timeout_secs),
            crawl_delay_ms: self.crawl_delay_ms.unwrap_or(builtin.crawl_delay_ms),
        }
    }
}

/// Settings shared by `[defaults]` and every `[vendors.X]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsSection {
    pub output_dir: Option<PathBuf>,
    pub recrawl_interval_hours: Option<u64>,
    pub output_formats: Option<Vec<OutputFormat>>,
    pub fetch_mode: Option<FetchMode>,
    pub write_json: Option<bool>,
    pub crawler: CrawlerOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSection {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorSection {
    pub name: Option<String>,
    pub base_url: Option<String>,
    #[serde(flatten)]
    pub settings: SettingsSection,
    #[serde(default)]
    pub products: BTreeMap<String, ProductSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: SettingsSection,
    #[serde(default)]
    pub vendors: BTreeMap<String, VendorSection>,
}

/// Fully resolved crawler timing and browser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlerSettings {
    pub headless: bool,
    pub debug: bool,
    pub wait_timeout_ms: u64,
    pub click_timeout_ms: u64,
    pub click_pause_ms: u64,
    pub settle_quiet_ms: u64,
    pub settle_max_ms: u64,
    pub product_timeout_secs: u64,
    pub crawl_delay_ms: u64,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            headless: true,
            debug: false,
            wait_timeout_ms: 20_000,
            click_timeout_ms: 5_000,
            click_pause_ms: 50,
            settle_quiet_ms: 200,
            settle_max_ms: 5_000,
            product_timeout_secs: 900,
            crawl_delay_ms: 500,
        }
    }
}

impl CrawlerSettings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn click_timeout(&self) -> Duration {
        Duration::from_millis(self.click_timeout_ms)
    }

    pub fn click_pause(&self) -> Duration {
        Duration::from_millis(self.click_pause_ms)
    }

    pub fn settle_quiet(&self) -> Duration {
        Duration::from_millis(self.settle_quiet_ms)
    }

    pub fn settle_max(&self) -> Duration {
        Duration::from_millis(self.settle_max_ms)
    }

    pub fn product_timeout(&self) -> Duration {
        Duration::from_secs(self.product_timeout_secs)
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn settle_options(&self) -> SettleOptions {
        SettleOptions {
            click_pause: self.click_pause(),
            click_timeout: self.click_timeout(),
            quiet: self.settle_quiet(),
            max: self.settle_max(),
        }
    }

    /// Debug mode always shows the browser window.
    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            headless: self.headless && !self.debug,
            request_timeout: self.wait_timeout(),
            settle_quiet: self.settle_quiet(),
            settle_max: self.settle_max(),
            ..ChromeOptions::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    pub output_dir: PathBuf,
    /// `None` means previous output never suppresses a crawl.
    pub recrawl_interval: Option<Duration>,
    pub output_formats: Vec<OutputFormat>,
    pub fetch_mode: FetchMode,
    pub write_json: bool,
    pub crawler: CrawlerSettings,
}

impl HarvestSettings {
    pub fn links_dir(&self) -> PathBuf {
        self.output_dir.join("links")
    }

    pub fn content_dir(&self) -> PathBuf {
        self.output_dir.join("content")
    }
}

/// One documentation product to crawl; immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUnit {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub start_url: String,
}

#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub key: String,
    pub name: String,
    pub base_url: String,
    pub settings: HarvestSettings,
    products: BTreeMap<String, ProductSection>,
}

impl VendorConfig {
    pub fn product(&self, key: &str) -> Result<ProductUnit> {
        let section = self
            .products
            .get(key)
            .ok_or_else(|| HarvestError::UnknownProduct {
                vendor: self.key.clone(),
                product: key.to_string(),
            })?;
        self.product_unit(key, section)
    }

    /// All configured products in key order.
    pub fn products(&self) -> Result<Vec<ProductUnit>> {
        self.products
            .iter()
            .map(|(key, section)| self.product_unit(key, section))
            .collect()
    }

    pub fn product_keys(&self) -> Vec<&str> {
        self.products.keys().map(String::as_str).collect()
    }

    fn product_unit(&self, key: &str, section: &ProductSection) -> Result<ProductUnit> {
        let start_url = section.url.clone().ok_or_else(|| {
            HarvestError::MissingSetting(format!("vendors.{}.products.{}.url", self.key, key))
        })?;

        Ok(ProductUnit {
            key: key.to_string(),
            display_name: section.name.clone().unwrap_or_else(|| key.to_string()),
            description: section.description.clone().unwrap_or_default(),
            start_url,
        })
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| HarvestError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Configured vendor keys, sorted.
    pub fn vendor_keys(&self) -> Vec<&str> {
        self.vendors.keys().map(String::as_str).collect()
    }

    /// Resolves a vendor section, merging it over `[defaults]`.
    pub fn vendor(&self, key: &str) -> Result<VendorConfig> {
        let section = self
            .vendors
            .get(key)
            .ok_or_else(|| HarvestError::UnknownVendor(key.to_string()))?;

        let base_url = section
            .base_url
            .clone()
            .or_else(|| VendorAdapter::for_vendor(key).map(|a| a.default_base_url.to_string()))
            .ok_or_else(|| HarvestError::MissingSetting(format!("vendors.{}.base_url", key)))?;

        Ok(VendorConfig {
            key: key.to_string(),
            name: section.name.clone().unwrap_or_else(|| key.to_string()),
            base_url,
            settings: self.merge_settings(&section.settings),
            products: section.products.clone(),
        })
    }

    fn merge_settings(&self, vendor: &SettingsSection) -> HarvestSettings {
        let defaults = &self.defaults;
        let interval_hours = vendor
            .recrawl_interval_hours
            .or(defaults.recrawl_interval_hours)
            .unwrap_or(0);

        HarvestSettings {
            output_dir: vendor
                .output_dir
                .clone()
                .or_else(|| defaults.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from("out")),
            recrawl_interval: (interval_hours > 0)
                .then(|| Duration::from_secs(interval_hours * 3600)),
            output_formats: vendor
                .output_formats
                .clone()
                .or_else(|| defaults.output_formats.clone())
                .unwrap_or_else(|| vec![OutputFormat::Md]),
            fetch_mode: vendor
                .fetch_mode
                .or(defaults.fetch_mode)
                .unwrap_or(FetchMode::Browser),
            write_json: vendor.write_json.or(defaults.write_json).unwrap_or(false),
            crawler: vendor.crawler.or(&defaults.crawler).resolve(),
        }
    }
}
