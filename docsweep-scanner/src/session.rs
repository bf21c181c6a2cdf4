use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of waiting for the rendered tree to stop changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// No mutation was observed for the requested quiet period.
    Quiet,
    /// The upper bound was reached while the tree was still changing.
    TimedOut,
}

/// A controllable page bound to a real rendering engine.
///
/// Node handles are only valid until the next mutation of the tree; callers
/// re-query after every click instead of holding on to them.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Node: Send + Sync;

    async fn goto(&self, url: &str) -> Result<()>;

    /// First element matching `selector`, searched under `scope` or the whole document.
    async fn query(&self, scope: Option<&Self::Node>, selector: &str) -> Result<Option<Self::Node>>;

    async fn query_all(&self, scope: Option<&Self::Node>, selector: &str) -> Result<Vec<Self::Node>>;

    /// Nearest ancestor-or-self matching `selector`.
    async fn closest(&self, node: &Self::Node, selector: &str) -> Result<Option<Self::Node>>;

    async fn text(&self, node: &Self::Node) -> Result<Option<String>>;

    async fn attribute(&self, node: &Self::Node, name: &str) -> Result<Option<String>>;

    async fn is_visible(&self, node: &Self::Node) -> Result<bool>;

    /// Structural position of the node (child indices from the document root).
    async fn signature(&self, node: &Self::Node) -> Result<String>;

    async fn scroll_into_view(&self, node: &Self::Node) -> Result<()>;

    async fn click(&self, node: &Self::Node) -> Result<()>;

    /// Waits until no DOM mutation has happened for `quiet`, giving up after `max`.
    async fn wait_for_quiescence(&self, quiet: Duration, max: Duration) -> Result<Settle>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String>;

    /// Polls for `selector` until it appears or `timeout` elapses.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<Option<Self::Node>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(node) = self.query(None, selector).await? {
                return Ok(Some(node));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Anything that can hand back the HTML of a document URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}
