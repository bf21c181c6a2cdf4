use crate::manifest::find_manifests;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Decides whether a (vendor, product) unit was harvested recently enough to skip.
#[derive(Debug, Clone)]
pub struct FreshnessGate {
    links_dir: PathBuf,
    interval: Option<Duration>,
}

impl FreshnessGate {
    /// A `None` or zero interval never skips.
    pub fn new(links_dir: impl Into<PathBuf>, interval: Option<Duration>) -> Self {
        Self {
            links_dir: links_dir.into(),
            interval: interval.filter(|i| !i.is_zero()),
        }
    }

    pub fn should_skip(&self, vendor: &str, product: &str) -> bool {
        self.should_skip_at(vendor, product, SystemTime::now())
    }

    pub fn should_skip_at(&self, vendor: &str, product: &str, now: SystemTime) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        let Some(modified) = self.latest_modification(vendor, product) else {
            return false;
        };

        // A clock that went backwards counts as fresh
        let age = now.duration_since(modified).unwrap_or_default();
        let fresh = age < interval;
        if fresh {
            debug!(
                "{}/{}: last manifest is {:?} old (interval {:?}), skipping",
                vendor, product, age, interval
            );
        }
        fresh
    }

    /// Most recent manifest modification time for the unit.
    pub fn latest_modification(&self, vendor: &str, product: &str) -> Option<SystemTime> {
        find_manifests(&self.links_dir, vendor, Some(product))
            .ok()?
            .iter()
            .filter_map(|path| path.metadata().ok()?.modified().ok())
            .max()
    }
}
