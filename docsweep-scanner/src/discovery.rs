use crate::adapter::{LinkCandidate, NodeKey, TitleSource, Trigger, VendorAdapter};
use crate::error::{Result, ScanError};
use crate::result::{LinkRecord, normalize_title};
use crate::session::{BrowserSession, Settle};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub type EventCallback = Arc<dyn Fn(DiscoveryEvent) + Send + Sync>;

/// Everything the engine reports while expanding and harvesting one sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    SidebarMissing { selector: String },
    ExpansionRound { round: usize, pending: usize },
    Clicked { key: String },
    ClickFailed { key: String, error: String },
    SettleTimedOut { round: usize },
    Expanded { rounds: usize, clicked: usize },
    LinkRejected { href: String },
    DuplicateLink { url: String },
    Completed { links: usize },
}

/// Timing knobs for the expansion loop.
#[derive(Debug, Clone)]
pub struct SettleOptions {
    /// Pause after each individual click.
    pub click_pause: Duration,
    /// Bound on scrolling to and clicking one node.
    pub click_timeout: Duration,
    /// Mutation-free period that counts as settled.
    pub quiet: Duration,
    /// Upper bound on one settle wait.
    pub max: Duration,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self {
            click_pause: Duration::from_millis(50),
            click_timeout: Duration::from_secs(5),
            quiet: Duration::from_millis(200),
            max: Duration::from_secs(5),
        }
    }
}

/// Fixed-point expansion of a vendor sidebar followed by a single link harvest.
///
/// Expanded-node markers live only inside one [`Discoverer::expand_and_collect`]
/// call; nothing is shared between calls or sessions.
pub struct Discoverer {
    adapter: VendorAdapter,
    base_url: Url,
    settle: SettleOptions,
    sidebar_timeout: Duration,
    event_callback: Option<EventCallback>,
}

impl Discoverer {
    pub fn new(adapter: &VendorAdapter, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            adapter: adapter.clone(),
            base_url,
            settle: SettleOptions::default(),
            sidebar_timeout: Duration::from_secs(20),
            event_callback: None,
        })
    }

    pub fn with_settle(mut self, settle: SettleOptions) -> Self {
        self.settle = settle;
        self
    }

    /// How long to wait for the sidebar container to render.
    pub fn with_sidebar_timeout(mut self, timeout: Duration) -> Self {
        self.sidebar_timeout = timeout;
        self
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    pub fn adapter(&self) -> &VendorAdapter {
        &self.adapter
    }

    pub async fn expand_and_collect<S: BrowserSession>(&self, session: &S) -> Result<Vec<LinkRecord>> {
        let sidebar_selector = self.adapter.sidebar_selector;
        if session
            .wait_for(sidebar_selector, self.sidebar_timeout)
            .await?
            .is_none()
        {
            warn!(
                "[{}] sidebar {} not found, no links discovered",
                self.adapter.vendor, sidebar_selector
            );
            self.emit(DiscoveryEvent::SidebarMissing {
                selector: sidebar_selector.to_string(),
            });
            return Ok(Vec::new());
        }

        self.expand_all(session).await?;
        let links = self.collect_links(session).await?;

        info!("[{}] discovered {} document links", self.adapter.vendor, links.len());
        self.emit(DiscoveryEvent::Completed { links: links.len() });
        Ok(links)
    }

    async fn expand_all<S: BrowserSession>(&self, session: &S) -> Result<()> {
        let mut attempted: HashSet<String> = HashSet::new();
        let mut rounds = 0;
        let mut clicked = 0;

        loop {
            // The tree re-renders after clicks; never reuse handles across rounds
            let Some(sidebar) = session.query(None, self.adapter.sidebar_selector).await? else {
                warn!("[{}] sidebar disappeared during expansion", self.adapter.vendor);
                break;
            };

            let collapsed = session
                .query_all(Some(&sidebar), self.adapter.collapsed_selector)
                .await?;

            let mut pending = Vec::new();
            for node in collapsed {
                match session.is_visible(&node).await {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) if e.is_transient() => continue,
                    Err(e) => return Err(e),
                }

                let key = match self.node_key(session, &node).await {
                    Ok(key) => key,
                    Err(e) if e.is_transient() => continue,
                    Err(e) => return Err(e),
                };

                // Marked before clicking so a click that changes nothing is never retried
                if attempted.insert(key.clone()) {
                    pending.push((key, node));
                }
            }

            if pending.is_empty() {
                break;
            }

            rounds += 1;
            debug!(
                "[{}] expansion round {}: {} collapsed nodes",
                self.adapter.vendor,
                rounds,
                pending.len()
            );
            self.emit(DiscoveryEvent::ExpansionRound {
                round: rounds,
                pending: pending.len(),
            });

            for (key, node) in pending {
                match self.click_collapsed(session, &node).await {
                    Ok(()) => {
                        clicked += 1;
                        self.emit(DiscoveryEvent::Clicked { key });
                    }
                    Err(e) if e.is_transient() => {
                        warn!("[{}] failed to expand node {}: {}", self.adapter.vendor, key, e);
                        self.emit(DiscoveryEvent::ClickFailed {
                            key,
                            error: e.to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }

                if !self.settle.click_pause.is_zero() {
                    tokio::time::sleep(self.settle.click_pause).await;
                }
            }

            match session
                .wait_for_quiescence(self.settle.quiet, self.settle.max)
                .await
            {
                Ok(Settle::Quiet) => {}
                Ok(Settle::TimedOut) => {
                    warn!(
                        "[{}] DOM still changing after {:?} in round {}; expansion may be incomplete",
                        self.adapter.vendor, self.settle.max, rounds
                    );
                    self.emit(DiscoveryEvent::SettleTimedOut { round: rounds });
                }
                Err(e) if e.is_transient() => {
                    warn!("[{}] settle wait failed: {}", self.adapter.vendor, e);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "[{}] expansion reached fixed point after {} rounds ({} nodes clicked)",
            self.adapter.vendor, rounds, clicked
        );
        self.emit(DiscoveryEvent::Expanded { rounds, clicked });
        Ok(())
    }

    async fn node_key<S: BrowserSession>(&self, session: &S, node: &S::Node) -> Result<String> {
        if let NodeKey::Attribute(name) = self.adapter.node_key
            && let Some(value) = session.attribute(node, name).await?
            && !value.trim().is_empty()
        {
            return Ok(format!("{}={}", name, value.trim()));
        }
        session.signature(node).await
    }

    async fn click_collapsed<S: BrowserSession>(&self, session: &S, node: &S::Node) -> Result<()> {
        let timeout = self.settle.click_timeout;
        match self.adapter.trigger {
            Trigger::Itself => {
                bounded("scroll", timeout, session.scroll_into_view(node)).await?;
                bounded("click", timeout, session.click(node)).await
            }
            Trigger::Closest(selector) => {
                let target = session
                    .closest(node, selector)
                    .await?
                    .ok_or_else(|| ScanError::ElementNotFound(format!("trigger {}", selector)))?;
                bounded("scroll", timeout, session.scroll_into_view(&target)).await?;
                bounded("click", timeout, session.click(&target)).await
            }
        }
    }

    async fn collect_links<S: BrowserSession>(&self, session: &S) -> Result<Vec<LinkRecord>> {
        let Some(sidebar) = session.query(None, self.adapter.sidebar_selector).await? else {
            self.emit(DiscoveryEvent::SidebarMissing {
                selector: self.adapter.sidebar_selector.to_string(),
            });
            return Ok(Vec::new());
        };

        let anchors = session
            .query_all(Some(&sidebar), self.adapter.link_selector)
            .await?;
        debug!("[{}] {} candidate anchors", self.adapter.vendor, anchors.len());

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in anchors {
            let (href, title) = match self.read_anchor(session, &anchor).await {
                Ok(Some(pair)) => pair,
                Ok(None) => continue,
                Err(e) if e.is_transient() => {
                    debug!("[{}] skipping unreadable anchor: {}", self.adapter.vendor, e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(absolute) = self.adapter.resolve(&self.base_url, &href) else {
                self.emit(DiscoveryEvent::LinkRejected { href });
                continue;
            };

            let candidate = LinkCandidate {
                href: &href,
                absolute: &absolute,
                base: &self.base_url,
            };
            if !(self.adapter.is_valid_document)(&candidate) {
                debug!("[{}] rejected {}", self.adapter.vendor, absolute);
                self.emit(DiscoveryEvent::LinkRejected { href });
                continue;
            }

            let canonical = (self.adapter.canonicalize)(&absolute);
            if !seen.insert(canonical) {
                self.emit(DiscoveryEvent::DuplicateLink {
                    url: absolute.to_string(),
                });
                continue;
            }

            if let Some(record) = LinkRecord::new(absolute.as_str(), &title) {
                links.push(record);
            }
        }

        Ok(links)
    }

    /// Reads `(href, title)` from an anchor; `None` when either is empty.
    async fn read_anchor<S: BrowserSession>(
        &self,
        session: &S,
        anchor: &S::Node,
    ) -> Result<Option<(String, String)>> {
        let mut href = None;
        for attribute in self.adapter.href_attributes {
            if let Some(value) = session.attribute(anchor, attribute).await?
                && !value.trim().is_empty()
            {
                href = Some(value.trim().to_string());
                break;
            }
        }
        let Some(href) = href else {
            return Ok(None);
        };

        let raw_title = match self.adapter.title_source {
            TitleSource::AnchorText => session.text(anchor).await?,
            TitleSource::Descendant(selector) => match session.query(Some(anchor), selector).await? {
                Some(label) => session.text(&label).await?,
                None => None,
            },
        };

        let title = normalize_title(raw_title.as_deref().unwrap_or_default());
        if title.is_empty() {
            return Ok(None);
        }

        Ok(Some((href, title)))
    }

    fn emit(&self, event: DiscoveryEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}

async fn bounded<F>(operation: &str, after: Duration, future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| ScanError::timeout(operation, after))?
}
