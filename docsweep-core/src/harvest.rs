use crate::config::{CrawlerSettings, ProductUnit, VendorConfig};
use crate::error::{HarvestError, Result};
use crate::extract::extractor_for;
use crate::freshness::FreshnessGate;
use crate::manifest::{latest_manifests, read_manifest, write_manifest};
use crate::report::{HarvestSummary, ProductOutcome};
use crate::store::{DocumentRecord, DocumentWriter};
use docsweep_scanner::{
    BrowserSession, Discoverer, EventCallback, LinkRecord, PageSource, ScanError, Settle,
    VendorAdapter,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

/// Product key recorded for documents fetched through the single-URL entry point.
pub const SINGLE_URL_PRODUCT: &str = "single_url";

/// Product key for outcomes that concern a whole vendor.
pub const ALL_PRODUCTS: &str = "*";

/// Callback for reporting harvest progress
pub type HarvestProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Options for a link harvest
#[derive(Clone, Default)]
pub struct HarvestOptions {
    pub show_progress_bars: bool,
    pub progress_callback: Option<HarvestProgressCallback>,
    pub event_callback: Option<EventCallback>,
}

/// Options for content extraction
#[derive(Clone, Default)]
pub struct ExtractOptions {
    pub crawl_delay: Duration,
    pub show_progress_bars: bool,
    pub progress_callback: Option<HarvestProgressCallback>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub extracted: usize,
    pub failed: usize,
}

fn report(callback: &Option<HarvestProgressCallback>, message: String) {
    if let Some(callback) = callback {
        callback(message);
    }
}

fn spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Runs link discovery for each product and writes one manifest per product.
///
/// A product that fails, times out or yields no links is recorded in the
/// summary and the batch moves on. Only an unsupported vendor is fatal.
pub async fn harvest_links<S: BrowserSession>(
    session: &S,
    vendor: &VendorConfig,
    products: &[ProductUnit],
    options: &HarvestOptions,
) -> Result<HarvestSummary> {
    let adapter = VendorAdapter::for_vendor(&vendor.key)
        .ok_or_else(|| HarvestError::UnknownVendor(vendor.key.clone()))?;
    let settings = &vendor.settings;
    let crawler = &settings.crawler;

    let mut discoverer = Discoverer::new(adapter, &vendor.base_url)?
        .with_settle(crawler.settle_options())
        .with_sidebar_timeout(crawler.wait_timeout());
    if let Some(ref callback) = options.event_callback {
        discoverer = discoverer.with_event_callback(callback.clone());
    }

    let gate = FreshnessGate::new(settings.links_dir(), settings.recrawl_interval);
    let progress_bar = spinner(options.show_progress_bars, "Starting link harvest...");
    let mut summary = HarvestSummary::new();

    for (idx, product) in products.iter().enumerate() {
        let started = Instant::now();
        let label = format!(
            "[{}/{}] {} ({})",
            idx + 1,
            products.len(),
            product.display_name,
            product.key
        );
        if let Some(ref pb) = progress_bar {
            pb.set_message(format!("Discovering {}", label));
        }
        report(&options.progress_callback, format!("Discovering {}", label));

        if gate.should_skip(&vendor.key, &product.key) {
            info!("{}/{}: recent manifest found, skipping", vendor.key, product.key);
            summary.record(
                &vendor.key,
                &product.key,
                &product.display_name,
                ProductOutcome::Skipped {
                    reason: "manifest newer than recrawl interval".to_string(),
                },
                started.elapsed(),
            );
            continue;
        }

        let discovery = discover_product(session, &discoverer, product, crawler);
        let outcome = match tokio::time::timeout(crawler.product_timeout(), discovery).await {
            Ok(Ok(links)) if links.is_empty() => Err(HarvestError::NoLinks(format!(
                "{}/{}",
                vendor.key, product.key
            ))),
            Ok(Ok(links)) => write_manifest(
                &settings.links_dir(),
                &vendor.key,
                product,
                &links,
                settings.write_json,
            )
            .map(|manifest| ProductOutcome::Collected {
                links: links.len(),
                manifest,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(HarvestError::ProductTimeout {
                product: product.key.clone(),
                after: crawler.product_timeout(),
            }),
        };

        let outcome = match outcome {
            Ok(outcome) => {
                if let ProductOutcome::Collected { links, ref manifest } = outcome {
                    info!(
                        "{}/{}: {} links written to {}",
                        vendor.key,
                        product.key,
                        links,
                        manifest.display()
                    );
                }
                outcome
            }
            Err(e) => {
                error!("{}/{}: {}", vendor.key, product.key, e);
                report(
                    &options.progress_callback,
                    format!("[!]  Failed {}: {}", product.key, e),
                );
                ProductOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        summary.record(
            &vendor.key,
            &product.key,
            &product.display_name,
            outcome,
            started.elapsed(),
        );
    }

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Link harvest complete! {} links from {} products",
            summary.total_links(),
            products.len()
        ));
    }

    Ok(summary)
}

async fn discover_product<S: BrowserSession>(
    session: &S,
    discoverer: &Discoverer,
    product: &ProductUnit,
    crawler: &CrawlerSettings,
) -> Result<Vec<LinkRecord>> {
    session.goto(&product.start_url).await?;
    if session
        .wait_for_quiescence(crawler.settle_quiet(), crawler.settle_max())
        .await?
        == Settle::TimedOut
    {
        debug!("{} still rendering after {:?}", product.start_url, crawler.settle_max());
    }
    Ok(discoverer.expand_and_collect(session).await?)
}

/// Parses a fetched page into a document record.
pub fn build_document(
    page_html: &str,
    url: &str,
    vendor: &str,
    product: &str,
    fallback_title: Option<&str>,
) -> Result<DocumentRecord> {
    let page_url =
        Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
    let extraction = extractor_for(vendor).extract(page_html, &page_url);
    Ok(DocumentRecord::from_extraction(
        extraction,
        url,
        vendor,
        product,
        fallback_title,
    ))
}

/// Fetches, converts and persists every linked document. Per-document
/// failures are logged and counted.
pub async fn extract_documents<P: PageSource + ?Sized>(
    source: &P,
    vendor: &str,
    product: &str,
    links: &[LinkRecord],
    writer: &DocumentWriter,
    options: &ExtractOptions,
) -> ExtractionStats {
    let mut stats = ExtractionStats::default();

    let progress_bar = options.show_progress_bars.then(|| {
        let pb = ProgressBar::new(links.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    });

    for (idx, link) in links.iter().enumerate() {
        if idx > 0 && !options.crawl_delay.is_zero() {
            tokio::time::sleep(options.crawl_delay).await;
        }
        if let Some(ref pb) = progress_bar {
            pb.set_message(link.title.clone());
        }

        match extract_one(source, vendor, product, link, writer).await {
            Ok(paths) => {
                debug!("{} -> {:?}", link.url, paths);
                stats.extracted += 1;
            }
            Err(e) => {
                warn!("Failed to extract {}: {}", link.url, e);
                report(
                    &options.progress_callback,
                    format!("[!]  Failed to extract {}: {}", link.url, e),
                );
                stats.failed += 1;
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "{} extracted, {} failed",
            stats.extracted, stats.failed
        ));
    }

    stats
}

async fn extract_one<P: PageSource + ?Sized>(
    source: &P,
    vendor: &str,
    product: &str,
    link: &LinkRecord,
    writer: &DocumentWriter,
) -> Result<Vec<PathBuf>> {
    let page_html = source.fetch_html(&link.url).await?;
    let record = build_document(&page_html, &link.url, vendor, product, Some(&link.title))?;
    writer.write(&record)
}

/// Extracts content for the newest manifest of each product (or one product).
pub async fn extract_from_manifests<P: PageSource + ?Sized>(
    source: &P,
    vendor: &VendorConfig,
    product: Option<&str>,
    options: &ExtractOptions,
) -> Result<HarvestSummary> {
    if let Some(key) = product {
        vendor.product(key)?;
    }

    let settings = &vendor.settings;
    let manifests = latest_manifests(&settings.links_dir(), &vendor.key, product)?;
    if manifests.is_empty() {
        let unit = match product {
            Some(key) => format!("{}/{}", vendor.key, key),
            None => vendor.key.clone(),
        };
        return Err(HarvestError::NoLinks(unit));
    }

    let writer = DocumentWriter::new(settings.content_dir(), settings.output_formats.clone());
    let mut summary = HarvestSummary::new();

    for (key, manifest) in manifests {
        let started = Instant::now();
        let display_name = vendor
            .product(&key)
            .map(|unit| unit.display_name)
            .unwrap_or_else(|_| key.clone());

        let links = match read_manifest(&manifest) {
            Ok(links) if !links.is_empty() => links,
            Ok(_) => {
                warn!("{} lists no documents", manifest.display());
                summary.record(
                    &vendor.key,
                    &key,
                    &display_name,
                    ProductOutcome::Failed {
                        error: format!("{} lists no documents", manifest.display()),
                    },
                    started.elapsed(),
                );
                continue;
            }
            Err(e) => {
                error!("Failed to read {}: {}", manifest.display(), e);
                summary.record(
                    &vendor.key,
                    &key,
                    &display_name,
                    ProductOutcome::Failed {
                        error: e.to_string(),
                    },
                    started.elapsed(),
                );
                continue;
            }
        };

        info!(
            "{}/{}: extracting {} documents from {}",
            vendor.key,
            key,
            links.len(),
            manifest.display()
        );
        report(
            &options.progress_callback,
            format!("Extracting {} documents for {}", links.len(), display_name),
        );

        let stats = extract_documents(source, &vendor.key, &key, &links, &writer, options).await;
        summary.record(
            &vendor.key,
            &key,
            &display_name,
            ProductOutcome::Extracted {
                documents: stats.extracted,
                failed: stats.failed,
            },
            started.elapsed(),
        );
    }

    Ok(summary)
}

/// Extracts every product of one vendor, folding vendor-level failures into
/// the summary. A vendor without any manifest is reported as skipped.
pub async fn extract_vendor<P: PageSource + ?Sized>(
    source: &P,
    vendor: &VendorConfig,
    options: &ExtractOptions,
) -> HarvestSummary {
    let started = Instant::now();
    let options = ExtractOptions {
        crawl_delay: vendor.settings.crawler.crawl_delay(),
        ..options.clone()
    };

    match extract_from_manifests(source, vendor, None, &options).await {
        Ok(summary) => summary,
        Err(HarvestError::NoLinks(_)) => {
            info!("{}: no link manifests, nothing to extract", vendor.key);
            let mut summary = HarvestSummary::new();
            summary.record(
                &vendor.key,
                ALL_PRODUCTS,
                &vendor.name,
                ProductOutcome::Skipped {
                    reason: "no link manifests".to_string(),
                },
                started.elapsed(),
            );
            summary
        }
        Err(e) => {
            error!("{}: {}", vendor.key, e);
            let mut summary = HarvestSummary::new();
            summary.record(
                &vendor.key,
                ALL_PRODUCTS,
                &vendor.name,
                ProductOutcome::Failed {
                    error: e.to_string(),
                },
                started.elapsed(),
            );
            summary
        }
    }
}

/// Batch extraction across vendors; one vendor failing never stops the rest.
pub async fn extract_all_vendors<P: PageSource + ?Sized>(
    source: &P,
    vendors: &[VendorConfig],
    options: &ExtractOptions,
) -> HarvestSummary {
    let mut summary = HarvestSummary::new();
    for vendor in vendors {
        report(
            &options.progress_callback,
            format!("Extracting content for {}", vendor.name),
        );
        summary.merge(extract_vendor(source, vendor, options).await);
    }
    summary
}

/// Single-URL entry point: no discovery, one document.
pub async fn extract_single_url<P: PageSource + ?Sized>(
    source: &P,
    vendor: &str,
    url: &str,
    writer: &DocumentWriter,
) -> Result<(DocumentRecord, Vec<PathBuf>)> {
    let page_html = source.fetch_html(url).await?;
    let record = build_document(&page_html, url, vendor, SINGLE_URL_PRODUCT, None)?;
    let paths = writer.write(&record)?;
    info!("Extracted '{}' from {}", record.title, url);
    Ok((record, paths))
}
