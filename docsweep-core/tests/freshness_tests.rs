// Tests for the recrawl freshness gate

use docsweep_core::freshness::FreshnessGate;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const HOUR: Duration = Duration::from_secs(3600);

fn manifest_aged(links_dir: &Path, name: &str, age: Duration) -> PathBuf {
    let vendor_dir = links_dir.join("aliyun");
    fs::create_dir_all(&vendor_dir).unwrap();
    let path = vendor_dir.join(name);
    fs::write(&path, "1. Doc\nhttps://help.aliyun.com/zh/ecs/doc\n").unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - age)
        .unwrap();
    path
}

// ============================================================================
// Skip Decision Tests
// ============================================================================

#[test]
fn test_recent_manifest_is_skipped() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", HOUR);

    let gate = FreshnessGate::new(dir.path(), Some(24 * HOUR));
    assert!(gate.should_skip_at("aliyun", "ecs", SystemTime::now()));
}

#[test]
fn test_stale_manifest_is_not_skipped() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", 48 * HOUR);

    let gate = FreshnessGate::new(dir.path(), Some(24 * HOUR));
    assert!(!gate.should_skip_at("aliyun", "ecs", SystemTime::now()));
}

#[test]
fn test_newest_manifest_decides() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", 72 * HOUR);
    manifest_aged(dir.path(), "aliyun_ecs_links_20250105_000000.txt", HOUR);

    let gate = FreshnessGate::new(dir.path(), Some(24 * HOUR));
    assert!(gate.should_skip("aliyun", "ecs"));
}

#[test]
fn test_other_products_do_not_count() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_oss_links_20250101_000000.txt", HOUR);

    let gate = FreshnessGate::new(dir.path(), Some(24 * HOUR));
    assert!(!gate.should_skip("aliyun", "ecs"));
}

#[test]
fn test_no_manifest_is_not_skipped() {
    let dir = TempDir::new().unwrap();
    let gate = FreshnessGate::new(dir.path(), Some(24 * HOUR));
    assert!(!gate.should_skip("aliyun", "ecs"));
}

// ============================================================================
// Disabled Gate Tests
// ============================================================================

#[test]
fn test_zero_interval_never_skips() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", Duration::ZERO);

    let gate = FreshnessGate::new(dir.path(), Some(Duration::ZERO));
    assert!(!gate.should_skip("aliyun", "ecs"));
}

#[test]
fn test_missing_interval_never_skips() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", Duration::ZERO);

    let gate = FreshnessGate::new(dir.path(), None);
    assert!(!gate.should_skip("aliyun", "ecs"));
}

// ============================================================================
// Modification Time Tests
// ============================================================================

#[test]
fn test_latest_modification() {
    let dir = TempDir::new().unwrap();
    let path = manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", 2 * HOUR);
    let expected = path.metadata().unwrap().modified().unwrap();

    let gate = FreshnessGate::new(dir.path(), Some(HOUR));
    assert_eq!(gate.latest_modification("aliyun", "ecs"), Some(expected));
    assert_eq!(gate.latest_modification("aliyun", "oss"), None);
}

#[test]
fn test_clock_behind_manifest_counts_as_fresh() {
    let dir = TempDir::new().unwrap();
    manifest_aged(dir.path(), "aliyun_ecs_links_20250101_000000.txt", Duration::ZERO);

    let gate = FreshnessGate::new(dir.path(), Some(HOUR));
    let earlier = SystemTime::now() - 10 * HOUR;
    assert!(gate.should_skip_at("aliyun", "ecs", earlier));
}
