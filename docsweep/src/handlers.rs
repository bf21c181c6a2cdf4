use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use docsweep_core::config::{Config, DEFAULT_CONFIG, FetchMode, HarvestSettings, ProductUnit, VendorConfig};
use docsweep_core::harvest::{
    ALL_PRODUCTS, ExtractOptions, HarvestOptions, HarvestProgressCallback, extract_from_manifests,
    extract_single_url, extract_vendor, harvest_links,
};
use docsweep_core::report::{HarvestSummary, ProductOutcome, generate_summary_report};
use docsweep_core::store::DocumentWriter;
use docsweep_scanner::{ChromeSession, HttpPageSource, PageSource, VendorAdapter};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, warn};
use url::Url;

// Helper functions

/// Installs the fmt subscriber on stderr. Safe to call more than once.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Parse a document URL, adding https:// when the scheme is missing.
pub fn parse_document_url(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
        && url.has_host()
    {
        return Some(url.to_string());
    }

    let with_scheme = format!("https://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.has_host() && !line.contains("://") => Some(url.to_string()),
        _ => None,
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| {
        format!(
            "Could not load configuration from {} (run `docsweep init` to create one)",
            path.display()
        )
    })
}

/// Writes the bundled configuration, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Every product of the vendor, or only `product` when given.
pub fn select_products(vendor: &VendorConfig, product: Option<&str>) -> Result<Vec<ProductUnit>> {
    let products = match product {
        Some(key) => vec![vendor.product(key)?],
        None => vendor.products()?,
    };
    if products.is_empty() {
        bail!("No products configured for vendor '{}'", vendor.key);
    }
    Ok(products)
}

/// One-line listing entry for a vendor.
pub fn describe_vendor(vendor: &VendorConfig) -> String {
    let discovery = if VendorAdapter::for_vendor(&vendor.key).is_some() {
        "built-in adapter"
    } else {
        "extraction only"
    };
    format!(
        "{} ({}) - {} products, {}, {}",
        vendor.key,
        vendor.name,
        vendor.product_keys().len(),
        vendor.base_url,
        discovery
    )
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", name))
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_prompt(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().to_lowercase())
}

pub fn print_banner() {
    print_divider();
    println!(
        "{} {}",
        "  DOCSWEEP".bright_white().bold(),
        env!("CARGO_PKG_VERSION").bright_blue()
    );
    println!("  {}", "cloud help portal harvester".bright_black());
    print_divider();
    println!();
}

fn print_summary(summary: &HarvestSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{}", generate_summary_report(summary));
    }
    if summary.has_failures() {
        bail!(
            "{} of {} products failed",
            summary.failed(),
            summary.products.len()
        );
    }
    Ok(())
}

fn progress_printer(quiet: bool) -> Option<HarvestProgressCallback> {
    if quiet {
        return None;
    }
    Some(Arc::new(|msg: String| {
        println!("{} {}", "→".blue(), msg);
    }))
}

/// A page source for content extraction, chosen by `fetch_mode`.
enum Source {
    Chrome(ChromeSession),
    Http(HttpPageSource),
}

impl Source {
    async fn open(settings: &HarvestSettings) -> Result<Self> {
        match settings.fetch_mode {
            FetchMode::Browser => {
                let session = ChromeSession::launch(&settings.crawler.chrome_options())
                    .await
                    .context("Failed to launch Chrome/Chromium")?;
                Ok(Source::Chrome(session))
            }
            FetchMode::Http => {
                let source = HttpPageSource::new(settings.crawler.wait_timeout())
                    .context("Failed to build HTTP client")?;
                Ok(Source::Http(source))
            }
        }
    }

    fn page_source(&self) -> &dyn PageSource {
        match self {
            Source::Chrome(session) => session,
            Source::Http(source) => source,
        }
    }

    async fn close(self) {
        if let Source::Chrome(mut session) = self
            && let Err(e) = session.close().await
        {
            warn!("Failed to shut down browser: {}", e);
        }
    }
}

// Command handlers

pub fn handle_init(config_path: &Path, force: bool) -> Result<()> {
    print_divider();
    println!("{}", "  DOCSWEEP INITIALIZATION".bright_white().bold());
    print_divider();
    println!();
    println!(
        "{} Target: {}",
        "→".blue(),
        config_path.display().to_string().bright_white()
    );
    println!();

    if config_path.exists() && !force {
        println!("{}", "⚠ WARNING".yellow().bold());
        println!("A configuration file already exists:");
        println!(
            "  {} {}",
            "•".yellow(),
            config_path.display().to_string().bright_white()
        );
        println!();

        let response = print_prompt("Overwrite it with the bundled defaults? [y/N]:")?;
        println!();
        if response != "y" && response != "yes" {
            println!("{} Initialization cancelled.", "✗".red().bold());
            return Ok(());
        }
        println!("{} Proceeding with overwrite", "→".yellow().bold());
    }

    write_default_config(config_path)?;

    let config = Config::from_toml_str(DEFAULT_CONFIG)?;
    println!(
        "{} Configuration written: {}",
        "✓".green().bold(),
        config_path.display().to_string().bright_white()
    );
    println!(
        "{} Vendors: {}",
        "✓".green().bold(),
        config.vendor_keys().join(", ").cyan()
    );
    println!();
    Ok(())
}

pub fn handle_vendors(config: &Config) -> Result<()> {
    let keys = config.vendor_keys();
    if keys.is_empty() {
        println!("{} No vendors configured", "ℹ".blue());
        return Ok(());
    }

    println!("{}", "CONFIGURED VENDORS".bright_blue().bold());
    for key in keys {
        match config.vendor(key) {
            Ok(vendor) => println!("  {} {}", "•".green(), describe_vendor(&vendor)),
            Err(e) => println!("  {} {}: {}", "✗".red(), key, e),
        }
    }
    Ok(())
}

pub fn handle_products(config: &Config, args: &ArgMatches) -> Result<()> {
    let vendor = config.vendor(required(args, "vendor")?)?;

    println!(
        "{} {}",
        vendor.name.bright_blue().bold(),
        format!("({})", vendor.key).bright_black()
    );
    for key in vendor.product_keys() {
        match vendor.product(key) {
            Ok(product) => {
                println!(
                    "  {} {} {}",
                    "•".green(),
                    product.key.bright_white().bold(),
                    product.display_name
                );
                println!("      {}", product.start_url.cyan());
                if !product.description.is_empty() {
                    println!("      {}", product.description.bright_black());
                }
            }
            Err(e) => println!("  {} {}: {}", "✗".red(), key, e),
        }
    }
    Ok(())
}

pub async fn handle_links(config: &Config, args: &ArgMatches, quiet: bool) -> Result<()> {
    let vendor = config.vendor(required(args, "vendor")?)?;
    let products = select_products(&vendor, args.get_one::<String>("product").map(String::as_str))?;
    let json = args.get_flag("json");

    if !quiet {
        println!(
            "{} Harvesting links for {} product(s) of {}\n",
            "→".blue(),
            products.len(),
            vendor.name.bright_white()
        );
    }

    let options = HarvestOptions {
        show_progress_bars: !quiet && !json,
        progress_callback: progress_printer(quiet || json),
        event_callback: None,
    };

    let mut session = ChromeSession::launch(&vendor.settings.crawler.chrome_options())
        .await
        .context("Failed to launch Chrome/Chromium")?;
    let result = harvest_links(&session, &vendor, &products, &options).await;
    if let Err(e) = session.close().await {
        warn!("Failed to shut down browser: {}", e);
    }

    let summary = result.with_context(|| format!("Link harvest for {} failed", vendor.key))?;
    print_summary(&summary, json)
}

pub async fn handle_content(config: &Config, args: &ArgMatches, quiet: bool) -> Result<()> {
    let json = args.get_flag("json");
    let Some(vendor_key) = args.get_one::<String>("vendor") else {
        return handle_content_all(config, json, quiet).await;
    };
    let vendor = config.vendor(vendor_key)?;
    let product = args.get_one::<String>("product").map(String::as_str);

    let options = ExtractOptions {
        crawl_delay: vendor.settings.crawler.crawl_delay(),
        show_progress_bars: !quiet && !json,
        progress_callback: progress_printer(quiet || json),
    };

    debug!("fetch mode: {:?}", vendor.settings.fetch_mode);
    let source = Source::open(&vendor.settings).await?;
    let result = extract_from_manifests(source.page_source(), &vendor, product, &options).await;
    source.close().await;

    let summary = result.with_context(|| format!("Content extraction for {} failed", vendor.key))?;
    print_summary(&summary, json)
}

/// Extracts every configured vendor in turn, each with its own page source.
async fn handle_content_all(config: &Config, json: bool, quiet: bool) -> Result<()> {
    let options = ExtractOptions {
        show_progress_bars: !quiet && !json,
        progress_callback: progress_printer(quiet || json),
        ..Default::default()
    };
    let mut summary = HarvestSummary::new();

    for key in config.vendor_keys() {
        let vendor = match config.vendor(key) {
            Ok(vendor) => vendor,
            Err(e) => {
                warn!("Skipping vendor {}: {}", key, e);
                summary.record(
                    key,
                    ALL_PRODUCTS,
                    key,
                    ProductOutcome::Failed {
                        error: e.to_string(),
                    },
                    Duration::ZERO,
                );
                continue;
            }
        };

        if !quiet && !json {
            println!("{} Extracting content for {}", "→".blue(), vendor.name.bright_white());
        }
        let source = match Source::open(&vendor.settings).await {
            Ok(source) => source,
            Err(e) => {
                warn!("Skipping vendor {}: {:#}", key, e);
                summary.record(
                    key,
                    ALL_PRODUCTS,
                    &vendor.name,
                    ProductOutcome::Failed {
                        error: format!("{:#}", e),
                    },
                    Duration::ZERO,
                );
                continue;
            }
        };
        summary.merge(extract_vendor(source.page_source(), &vendor, &options).await);
        source.close().await;
    }

    print_summary(&summary, json)
}

pub async fn handle_fetch(config: &Config, args: &ArgMatches) -> Result<()> {
    let raw_url = required(args, "url")?;
    let url = parse_document_url(raw_url).with_context(|| format!("Invalid document URL '{}'", raw_url))?;
    let vendor = config.vendor(required(args, "vendor")?)?;
    let settings = &vendor.settings;
    let writer = DocumentWriter::new(settings.content_dir(), settings.output_formats.clone());

    let source = Source::open(settings).await?;
    let result = extract_single_url(source.page_source(), &vendor.key, &url, &writer).await;
    source.close().await;

    let (record, paths) = result.with_context(|| format!("Failed to extract {}", url))?;
    println!(
        "{} {}",
        "✓".green().bold(),
        record.title.bright_white().bold()
    );
    if paths.is_empty() {
        println!("  {} page had no extractable content", "⚠".yellow());
    }
    for path in paths {
        println!("  {} {}", "→".blue(), path.display());
    }
    Ok(())
}
