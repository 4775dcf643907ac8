use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::error::{BrowserError, BrowserResult};
use super::BrowserPage;

type Generator = Arc<dyn Fn(usize) -> String + Send + Sync>;

enum Route {
    /// Stage `n` is served after `n` scrolls; the last stage repeats.
    Stages(Vec<String>),
    /// Content produced from the scroll count, never settles.
    Endless(Generator),
}

impl Route {
    fn render(&self, scrolls: usize) -> String {
        match self {
            Route::Stages(stages) => stages
                .get(scrolls)
                .or_else(|| stages.last())
                .cloned()
                .unwrap_or_default(),
            Route::Endless(generate) => generate(scrolls),
        }
    }
}

/// Set once the owning session has been shut down.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-memory page serving fixture HTML by address.
///
/// Lets the harvest/extract pipeline run against canned listings and detail
/// pages without a browser. Pauses are recorded instead of slept.
#[derive(Default)]
pub struct ScriptedPage {
    routes: HashMap<String, Route>,
    unreachable: HashSet<String>,
    stalled: HashSet<String>,
    unreadable: HashSet<String>,
    scroll_failure_after: Option<usize>,
    current: Option<String>,
    scrolls: usize,
    navigations: Vec<String>,
    pauses: Vec<Duration>,
    shutdown: ShutdownFlag,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: impl Into<String>) -> Self {
        self.with_stages(url, vec![html.into()])
    }

    /// A listing that reveals `stages[n]` after the n-th scroll.
    pub fn with_stages(mut self, url: &str, stages: Vec<String>) -> Self {
        self.routes.insert(url.to_string(), Route::Stages(stages));
        self
    }

    pub fn with_endless_page<F>(mut self, url: &str, generate: F) -> Self
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        self.routes
            .insert(url.to_string(), Route::Endless(Arc::new(generate)));
        self
    }

    /// Navigating to `url` fails.
    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.insert(url.to_string());
        self
    }

    /// `url` loads but its network never goes idle.
    pub fn with_stalled(mut self, url: &str) -> Self {
        self.stalled.insert(url.to_string());
        self
    }

    /// `url` loads but reading its rendered document fails.
    pub fn with_unreadable(mut self, url: &str) -> Self {
        self.unreadable.insert(url.to_string());
        self
    }

    fn current_in(&self, set: &HashSet<String>) -> bool {
        self.current.as_ref().is_some_and(|url| set.contains(url))
    }

    /// Every scroll after the first `count` on a page fails.
    pub fn with_scroll_failure_after(mut self, count: usize) -> Self {
        self.scroll_failure_after = Some(count);
        self
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn pauses(&self) -> &[Duration] {
        &self.pauses
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls
    }

    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    pub(crate) fn shutdown(self) {
        self.shutdown.0.store(true, Ordering::SeqCst);
    }

    fn current_route(&self) -> BrowserResult<&Route> {
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| BrowserError::Unexpected("no page loaded".to_string()))?;
        self.routes
            .get(url)
            .ok_or_else(|| BrowserError::Unexpected(format!("no fixture for {url}")))
    }
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn goto(&mut self, url: &str) -> BrowserResult<()> {
        self.navigations.push(url.to_string());
        if self.unreachable.contains(url) || !self.routes.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.current = Some(url.to_string());
        self.scrolls = 0;
        Ok(())
    }

    async fn wait_for_network_idle(
        &mut self,
        _idle: Duration,
        _timeout: Duration,
    ) -> BrowserResult<()> {
        self.current_route()?;
        if self.current_in(&self.stalled) {
            return Err(BrowserError::Timeout("network idle".to_string()));
        }
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> BrowserResult<()> {
        let parsed = Selector::parse(selector)
            .map_err(|err| BrowserError::Selector(format!("{selector}: {err:?}")))?;
        let html = self.current_route()?.render(self.scrolls);
        if Html::parse_document(&html).select(&parsed).next().is_some() {
            Ok(())
        } else {
            Err(BrowserError::Timeout(format!("selector `{selector}`")))
        }
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        self.current_route()?;
        if let Some(limit) = self.scroll_failure_after {
            if self.scrolls >= limit {
                return Err(BrowserError::Unexpected(
                    "execution context was destroyed".to_string(),
                ));
            }
        }
        self.scrolls += 1;
        Ok(())
    }

    async fn pause(&mut self, duration: Duration) -> BrowserResult<()> {
        self.pauses.push(duration);
        Ok(())
    }

    async fn content(&mut self) -> BrowserResult<String> {
        let html = self.current_route()?.render(self.scrolls);
        if self.current_in(&self.unreadable) {
            return Err(BrowserError::Unexpected(
                "execution context was destroyed".to_string(),
            ));
        }
        Ok(html)
    }

    async fn url(&mut self) -> BrowserResult<String> {
        self.current
            .clone()
            .ok_or_else(|| BrowserError::Unexpected("no page loaded".to_string()))
    }
}
