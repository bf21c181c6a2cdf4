use crate::error::{Result, ScanError};
use crate::session::{BrowserSession, PageSource, Settle};
use async_trait::async_trait;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const TARGET_MARKER: &str = "data-docsweep-target";

const VISIBLE_JS: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const style = window.getComputedStyle(this);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
}"#;

const SIGNATURE_JS: &str = r#"function() {
    const path = [];
    let node = this;
    while (node && node.parentElement) {
        path.push(Array.prototype.indexOf.call(node.parentElement.children, node));
        node = node.parentElement;
    }
    return '/' + path.reverse().join('/');
}"#;

#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,
    /// Per-command protocol timeout, also used for navigation.
    pub request_timeout: Duration,
    pub window_size: (u32, u32),
    /// Explicit browser binary; auto-detected when `None`.
    pub executable: Option<String>,
    /// Settle bounds applied after navigating in [`PageSource::fetch_html`].
    pub settle_quiet: Duration,
    pub settle_max: Duration,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            request_timeout: Duration::from_secs(20),
            window_size: (1920, 1080),
            executable: None,
            settle_quiet: Duration::from_millis(200),
            settle_max: Duration::from_secs(5),
        }
    }
}

/// One browser process with a single page, used for one product at a time.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    markers: AtomicU64,
    settle: (Duration, Duration),
}

impl ChromeSession {
    pub async fn launch(options: &ChromeOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .window_size(options.window_size.0, options.window_size.1)
            .no_sandbox();
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref executable) = options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(ScanError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!("Browser session started (headless: {})", options.headless);

        Ok(Self {
            browser,
            page,
            handler,
            markers: AtomicU64::new(0),
            settle: (options.settle_quiet, options.settle_max),
        })
    }

    /// Closes the browser and waits for the process to exit.
    pub async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        self.browser.wait().await?;
        self.handler.abort();
        debug!("Browser session closed");
        Ok(())
    }

    async fn call_js(&self, node: &Element, function: &str) -> Result<Option<serde_json::Value>> {
        let returns = node.call_js_fn(function, false).await?;
        Ok(returns.result.value)
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Node = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn query(&self, scope: Option<&Element>, selector: &str) -> Result<Option<Element>> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }

    async fn query_all(&self, scope: Option<&Element>, selector: &str) -> Result<Vec<Element>> {
        let elements = match scope {
            Some(root) => root.find_elements(selector).await?,
            None => self.page.find_elements(selector).await?,
        };
        Ok(elements)
    }

    async fn closest(&self, node: &Element, selector: &str) -> Result<Option<Element>> {
        // Tag the ancestor from inside the page, then look it up by that tag
        let marker = self.markers.fetch_add(1, Ordering::Relaxed).to_string();
        let selector_literal = serde_json::to_string(selector)
            .map_err(|e| ScanError::Script(e.to_string()))?;
        let function = format!(
            "function() {{ const target = this.closest({}); if (!target) return false; \
             target.setAttribute('{}', '{}'); return true; }}",
            selector_literal, TARGET_MARKER, marker
        );

        let tagged = self.call_js(node, &function).await?;
        if tagged != Some(serde_json::Value::Bool(true)) {
            return Ok(None);
        }

        let lookup = format!("[{}=\"{}\"]", TARGET_MARKER, marker);
        self.query(None, &lookup).await
    }

    async fn text(&self, node: &Element) -> Result<Option<String>> {
        Ok(node.inner_text().await?)
    }

    async fn attribute(&self, node: &Element, name: &str) -> Result<Option<String>> {
        Ok(node.attribute(name).await?)
    }

    async fn is_visible(&self, node: &Element) -> Result<bool> {
        let visible = self.call_js(node, VISIBLE_JS).await?;
        Ok(visible.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn signature(&self, node: &Element) -> Result<String> {
        let signature = self.call_js(node, SIGNATURE_JS).await?;
        signature
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| ScanError::Script("structural signature unavailable".to_string()))
    }

    async fn scroll_into_view(&self, node: &Element) -> Result<()> {
        node.scroll_into_view().await?;
        Ok(())
    }

    async fn click(&self, node: &Element) -> Result<()> {
        node.click().await?;
        Ok(())
    }

    async fn wait_for_quiescence(&self, quiet: Duration, max: Duration) -> Result<Settle> {
        let expression = format!(
            r#"new Promise(resolve => {{
                let timer = null;
                let cap = null;
                const observer = new MutationObserver(() => {{
                    clearTimeout(timer);
                    timer = setTimeout(() => done(true), {quiet});
                }});
                const done = (settled) => {{
                    observer.disconnect();
                    clearTimeout(timer);
                    clearTimeout(cap);
                    resolve(settled);
                }};
                observer.observe(document.documentElement, {{ childList: true, subtree: true, attributes: true }});
                timer = setTimeout(() => done(true), {quiet});
                cap = setTimeout(() => done(false), {max});
            }})"#,
            quiet = quiet.as_millis(),
            max = max.as_millis()
        );

        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(ScanError::Script)?;

        let result = self.page.evaluate(params).await?;
        let settled = result.value().and_then(|v| v.as_bool()).unwrap_or(false);
        Ok(if settled { Settle::Quiet } else { Settle::TimedOut })
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }
}

#[async_trait]
impl PageSource for ChromeSession {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.goto(url).await?;
        let (quiet, max) = self.settle;
        if self.wait_for_quiescence(quiet, max).await? == Settle::TimedOut {
            debug!("{} still rendering after {:?}, capturing anyway", url, max);
        }
        self.content().await
    }
}
