// Tests for run summary generation

use docsweep_core::report::{HarvestSummary, ProductOutcome, generate_summary_report};
use std::path::PathBuf;
use std::time::Duration;

fn mixed_summary() -> HarvestSummary {
    let mut summary = HarvestSummary::new();
    summary.record(
        "aliyun",
        "ecs",
        "Elastic Compute Service",
        ProductOutcome::Collected {
            links: 42,
            manifest: PathBuf::from("out/links/aliyun/aliyun_ecs_links_20250101_000000.txt"),
        },
        Duration::from_secs(3),
    );
    summary.record(
        "aliyun",
        "oss",
        "Object Storage Service",
        ProductOutcome::Skipped {
            reason: "manifest newer than recrawl interval".to_string(),
        },
        Duration::ZERO,
    );
    summary.record(
        "aliyun",
        "rds",
        "Relational Database",
        ProductOutcome::Failed {
            error: "Product 'rds' did not finish within 900s".to_string(),
        },
        Duration::from_secs(900),
    );
    summary
}

// ============================================================================
// Outcome Tests
// ============================================================================

#[test]
fn test_only_failed_is_failure() {
    assert!(ProductOutcome::Failed { error: "x".into() }.is_failure());
    assert!(!ProductOutcome::Skipped { reason: "x".into() }.is_failure());
    assert!(
        !ProductOutcome::Extracted {
            documents: 0,
            failed: 3
        }
        .is_failure()
    );
}

// ============================================================================
// Count Tests
// ============================================================================

#[test]
fn test_empty_summary() {
    let summary = HarvestSummary::new();
    assert_eq!(summary.succeeded(), 0);
    assert_eq!(summary.failed(), 0);
    assert_eq!(summary.total_links(), 0);
    assert!(!summary.has_failures());
}

#[test]
fn test_counts_by_outcome() {
    let summary = mixed_summary();

    assert_eq!(summary.products.len(), 3);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.total_links(), 42);
    assert_eq!(summary.total_documents(), 0);
    assert!(summary.has_failures());
}

#[test]
fn test_document_totals() {
    let mut summary = HarvestSummary::new();
    summary.record(
        "volcengine",
        "ecs",
        "ECS",
        ProductOutcome::Extracted {
            documents: 10,
            failed: 2,
        },
        Duration::from_secs(1),
    );
    summary.record(
        "volcengine",
        "vke",
        "VKE",
        ProductOutcome::Extracted {
            documents: 5,
            failed: 0,
        },
        Duration::from_secs(1),
    );

    assert_eq!(summary.total_documents(), 15);
    assert_eq!(summary.succeeded(), 2);
}

#[test]
fn test_merge_keeps_order() {
    let mut first = mixed_summary();
    let mut second = HarvestSummary::new();
    second.record(
        "tencentcloud",
        "cvm",
        "Cloud Virtual Machine",
        ProductOutcome::Collected {
            links: 8,
            manifest: PathBuf::from("cvm.txt"),
        },
        Duration::from_secs(1),
    );

    first.merge(second);
    assert_eq!(first.products.len(), 4);
    assert_eq!(first.products[3].vendor, "tencentcloud");
    assert_eq!(first.total_links(), 50);
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_report_header() {
    let report = generate_summary_report(&mixed_summary());

    assert!(report.starts_with("━━━"));
    assert!(report.contains("# Summary:"));
    assert!(report.contains("  Products: 3\n"));
    assert!(report.contains("  Succeeded: 1\n"));
    assert!(report.contains("  Skipped: 1\n"));
    assert!(report.contains("  Failed: 1\n"));
    assert!(report.contains("  Links collected: 42\n"));
    assert!(!report.contains("Documents extracted"));
}

#[test]
fn test_report_lists_each_product() {
    let report = generate_summary_report(&mixed_summary());

    assert!(report.contains("## Elastic Compute Service (aliyun/ecs)"));
    assert!(report.contains("[+] 42 links -> out/links/aliyun/aliyun_ecs_links_20250101_000000.txt"));
    assert!(report.contains("[=] skipped: manifest newer than recrawl interval"));
    assert!(report.contains("[!] failed: Product 'rds' did not finish within 900s"));
}

#[test]
fn test_report_total_time() {
    let report = generate_summary_report(&mixed_summary());
    assert!(report.contains("  Time: 903.00s\n"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_tags_outcomes() {
    let json = mixed_summary().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let products = value["products"].as_array().unwrap();
    assert_eq!(products[0]["outcome"]["status"], "collected");
    assert_eq!(products[0]["outcome"]["links"], 42);
    assert_eq!(products[1]["outcome"]["status"], "skipped");
    assert_eq!(products[2]["outcome"]["status"], "failed");
    assert_eq!(products[2]["duration_secs"], 900.0);
}

#[test]
fn test_json_report_round_trips() {
    let summary = mixed_summary();
    let json = summary.to_json().unwrap();
    let parsed: HarvestSummary = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.products, summary.products);
}
