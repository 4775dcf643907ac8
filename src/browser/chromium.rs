use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{BrowserError, BrowserResult};
use super::{BrowserOptions, BrowserPage};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Readiness and resource count of the current document.
const NETWORK_PROBE_SCRIPT: &str = r#"
(() => ({
    ready: document.readyState,
    resources: performance.getEntriesByType('resource').length
}))()
"#;

const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

#[derive(Debug, Deserialize, PartialEq)]
struct NetworkProbe {
    ready: String,
    resources: u64,
}

#[derive(Debug)]
pub struct ChromiumSession {
    browser: Browser,
    page: ChromiumPage,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    pub async fn launch(options: &BrowserOptions) -> BrowserResult<Self> {
        let mut builder = BrowserConfig::builder().request_timeout(options.navigation_timeout);
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        // with_head means NOT headless
        if !options.headless {
            builder = builder.with_head();
        }
        builder = builder.no_sandbox().args(vec![
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--no-first-run",
            "--no-default-browser-check",
        ]);
        let config = builder.build().map_err(BrowserError::Configuration)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| BrowserError::Launch(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(error = %err, "chromium handler reported error");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!(headless = options.headless, "chromium launched");

        Ok(Self {
            browser,
            page: ChromiumPage {
                page,
                navigation_timeout: options.navigation_timeout,
            },
            handler_task: Some(handler_task),
        })
    }

    pub fn page(&mut self) -> &mut ChromiumPage {
        &mut self.page
    }

    pub async fn shutdown(mut self) -> BrowserResult<()> {
        info!("shutting down chromium");
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "failed to close browser gracefully");
        }
        if let Some(handle) = self.handler_task.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "browser handler join error");
            }
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handle) = &self.handler_task {
            if !handle.is_finished() {
                warn!("chromium session dropped without explicit shutdown");
            }
        }
    }
}

#[derive(Debug)]
pub struct ChromiumPage {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromiumPage {
    async fn probe(&self) -> BrowserResult<NetworkProbe> {
        self.page
            .evaluate(NETWORK_PROBE_SCRIPT)
            .await?
            .into_value::<NetworkProbe>()
            .map_err(|err| BrowserError::Unexpected(format!("bad network probe payload: {err}")))
    }

    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(BrowserError::Configuration)?;
        let response = self.page.execute(params).await?;
        if let Some(reason) = response.result.error_text.clone() {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason,
            });
        }
        self.page.wait_for_navigation().await?;
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn goto(&mut self, url: &str) -> BrowserResult<()> {
        debug!(url, "navigating");
        match tokio::time::timeout(self.navigation_timeout, self.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout(format!("navigation to {url}"))),
        }
    }

    async fn wait_for_network_idle(
        &mut self,
        idle: Duration,
        timeout: Duration,
    ) -> BrowserResult<()> {
        let started = Instant::now();
        let mut last = self.probe().await?;
        let mut quiet_since = Instant::now();
        loop {
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout("network idle".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            let probe = self.probe().await?;
            if probe != last {
                last = probe;
                quiet_since = Instant::now();
                continue;
            }
            if last.ready == "complete" && quiet_since.elapsed() >= idle {
                return Ok(());
            }
        }
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let started = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(BrowserError::Timeout(format!("selector `{selector}`")));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        self.page.evaluate(SCROLL_TO_BOTTOM_SCRIPT).await?;
        Ok(())
    }

    async fn content(&mut self) -> BrowserResult<String> {
        Ok(self.page.content().await?)
    }

    async fn url(&mut self) -> BrowserResult<String> {
        self.page
            .url()
            .await?
            .ok_or_else(|| BrowserError::Unexpected("page has no url".to_string()))
    }
}
