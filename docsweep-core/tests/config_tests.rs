// Tests for configuration loading and vendor/default merging

use docsweep_core::config::{Config, DEFAULT_CONFIG, FetchMode, OutputFormat};
use docsweep_core::error::HarvestError;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

const SAMPLE: &str = r#"
[defaults]
output_dir = "/data/docs"
recrawl_interval_hours = 12
output_formats = ["md", "txt"]

[defaults.crawler]
click_pause_ms = 75
settle_max_ms = 4000

[vendors.tencentcloud]
name = "Tencent Cloud"
output_formats = ["txt"]
fetch_mode = "http"

[vendors.tencentcloud.crawler]
settle_max_ms = 9000
debug = true

[vendors.tencentcloud.products.cvm]
name = "Cloud Virtual Machine"
description = "Elastic compute"
url = "https://cloud.tencent.com/document/product/213"

[vendors.tencentcloud.products.broken]
name = "No start page"

[vendors.acme]
name = "Acme"
base_url = "https://docs.acme.example"
recrawl_interval_hours = 0

[vendors.acme.products.widgets]
url = "https://docs.acme.example/widgets"
"#;

// ============================================================================
// Bundled Configuration Tests
// ============================================================================

#[test]
fn test_bundled_config_parses() {
    let config = Config::from_toml_str(DEFAULT_CONFIG).unwrap();
    assert_eq!(
        config.vendor_keys(),
        vec!["aliyun", "huaweicloud", "tencentcloud", "volcengine"]
    );
}

#[test]
fn test_bundled_vendors_resolve_every_product() {
    let config = Config::from_toml_str(DEFAULT_CONFIG).unwrap();
    for key in config.vendor_keys() {
        let vendor = config.vendor(key).unwrap();
        let products = vendor.products().unwrap();
        assert!(!products.is_empty(), "{key} has no products");
        for product in products {
            assert!(product.start_url.starts_with("https://"), "{}", product.key);
        }
    }
}

#[test]
fn test_bundled_vendor_overrides_apply() {
    let config = Config::from_toml_str(DEFAULT_CONFIG).unwrap();

    let aliyun = config.vendor("aliyun").unwrap();
    assert_eq!(aliyun.settings.crawler.click_pause_ms, 100);
    assert_eq!(aliyun.settings.crawler.settle_max_ms, 5000);

    let volcengine = config.vendor("volcengine").unwrap();
    assert_eq!(volcengine.settings.crawler.settle_max_ms, 8000);
    assert_eq!(volcengine.settings.crawler.click_pause_ms, 50);
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_vendor_inherits_defaults() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let vendor = config.vendor("tencentcloud").unwrap();
    let settings = &vendor.settings;

    assert_eq!(settings.output_dir, PathBuf::from("/data/docs"));
    assert_eq!(settings.recrawl_interval, Some(Duration::from_secs(12 * 3600)));
    assert_eq!(settings.crawler.click_pause_ms, 75);
    assert_eq!(settings.links_dir(), PathBuf::from("/data/docs/links"));
    assert_eq!(settings.content_dir(), PathBuf::from("/data/docs/content"));
}

#[test]
fn test_vendor_values_override_defaults() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let settings = config.vendor("tencentcloud").unwrap().settings;

    assert_eq!(settings.output_formats, vec![OutputFormat::Txt]);
    assert_eq!(settings.fetch_mode, FetchMode::Http);
    assert_eq!(settings.crawler.settle_max_ms, 9000);
    assert_eq!(settings.crawler.settle_max(), Duration::from_secs(9));
}

#[test]
fn test_unset_values_use_builtins() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let settings = config.vendor("acme").unwrap().settings;

    assert_eq!(settings.fetch_mode, FetchMode::Browser);
    assert!(!settings.write_json);
    assert_eq!(settings.crawler.wait_timeout_ms, 20_000);
    assert_eq!(settings.crawler.product_timeout(), Duration::from_secs(900));
    assert_eq!(settings.output_formats, vec![OutputFormat::Md, OutputFormat::Txt]);
}

#[test]
fn test_zero_recrawl_interval_disables_gate() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let settings = config.vendor("acme").unwrap().settings;
    assert_eq!(settings.recrawl_interval, None);
}

#[test]
fn test_empty_config_has_builtin_defaults() {
    let config = Config::from_toml_str("[vendors.aliyun]\n").unwrap();
    let vendor = config.vendor("aliyun").unwrap();

    assert_eq!(vendor.base_url, "https://help.aliyun.com");
    assert_eq!(vendor.name, "aliyun");
    assert_eq!(vendor.settings.output_dir, PathBuf::from("out"));
    assert_eq!(vendor.settings.recrawl_interval, None);
    assert_eq!(vendor.settings.output_formats, vec![OutputFormat::Md]);
}

// ============================================================================
// Crawler Settings Tests
// ============================================================================

#[test]
fn test_debug_forces_headed_browser() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let crawler = config.vendor("tencentcloud").unwrap().settings.crawler;

    assert!(crawler.headless);
    assert!(!crawler.chrome_options().headless);
}

#[test]
fn test_settle_options_follow_crawler_settings() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let crawler = config.vendor("tencentcloud").unwrap().settings.crawler;
    let settle = crawler.settle_options();

    assert_eq!(settle.click_pause, Duration::from_millis(75));
    assert_eq!(settle.max, Duration::from_millis(9000));
    assert_eq!(settle.quiet, Duration::from_millis(200));
}

// ============================================================================
// Product Lookup Tests
// ============================================================================

#[test]
fn test_product_lookup() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let vendor = config.vendor("tencentcloud").unwrap();
    let product = vendor.product("cvm").unwrap();

    assert_eq!(product.key, "cvm");
    assert_eq!(product.display_name, "Cloud Virtual Machine");
    assert_eq!(product.description, "Elastic compute");
    assert_eq!(product.start_url, "https://cloud.tencent.com/document/product/213");
}

#[test]
fn test_product_name_defaults_to_key() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let product = config.vendor("acme").unwrap().product("widgets").unwrap();

    assert_eq!(product.display_name, "widgets");
    assert_eq!(product.description, "");
}

#[test]
fn test_product_keys_are_sorted() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let vendor = config.vendor("tencentcloud").unwrap();
    assert_eq!(vendor.product_keys(), vec!["broken", "cvm"]);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_unknown_vendor() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let result = config.vendor("nimbus");
    assert!(matches!(result, Err(HarvestError::UnknownVendor(ref v)) if v == "nimbus"));
}

#[test]
fn test_unknown_product() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let vendor = config.vendor("tencentcloud").unwrap();

    match vendor.product("cbs") {
        Err(HarvestError::UnknownProduct { vendor, product }) => {
            assert_eq!(vendor, "tencentcloud");
            assert_eq!(product, "cbs");
        }
        other => panic!("expected UnknownProduct, got {:?}", other),
    }
}

#[test]
fn test_product_without_url_is_missing_setting() {
    let config = Config::from_toml_str(SAMPLE).unwrap();
    let vendor = config.vendor("tencentcloud").unwrap();

    let err = vendor.product("broken").unwrap_err();
    assert!(matches!(err, HarvestError::MissingSetting(_)));
    assert!(err.to_string().contains("vendors.tencentcloud.products.broken.url"));
    assert!(vendor.products().is_err());
}

#[test]
fn test_unknown_vendor_without_base_url_is_missing_setting() {
    let config = Config::from_toml_str("[vendors.nimbus.products.vm]\nurl = \"https://nimbus.example/vm\"\n").unwrap();
    let err = config.vendor("nimbus").err().unwrap();
    assert!(matches!(err, HarvestError::MissingSetting(ref key) if key == "vendors.nimbus.base_url"));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let result = Config::from_toml_str("[defaults\noutput_dir = ");
    assert!(matches!(result, Err(HarvestError::ConfigParse(_))));
}

#[test]
fn test_invalid_output_format_is_parse_error() {
    let result = Config::from_toml_str("[defaults]\noutput_formats = [\"pdf\"]\n");
    assert!(matches!(result, Err(HarvestError::ConfigParse(_))));
}

// ============================================================================
// File Loading Tests
// ============================================================================

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.vendor_keys(), vec!["acme", "tencentcloud"]);
}

#[test]
fn test_load_missing_file() {
    let result = Config::load(std::path::Path::new("/nonexistent/docsweep/config.toml"));
    match result {
        Err(HarvestError::ConfigRead { path, .. }) => {
            assert_eq!(path, PathBuf::from("/nonexistent/docsweep/config.toml"));
        }
        other => panic!("expected ConfigRead, got {:?}", other.map(|_| ())),
    }
}
