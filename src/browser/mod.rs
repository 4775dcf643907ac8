//! Browser drivers the scraping pipeline runs against.
//!
//! The pipeline only ever talks to [`BrowserPage`]. Element queries are made on
//! the rendered HTML returned by [`BrowserPage::content`], so a driver only has
//! to navigate, wait, scroll and hand back a snapshot.

mod chromium;
mod error;
mod http;
#[cfg(any(test, feature = "testing"))]
mod scripted;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use chromium::{ChromiumPage, ChromiumSession};
pub use error::{BrowserError, BrowserResult};
pub use http::HttpPage;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{ScriptedPage, ShutdownFlag};

#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate the page to `url`.
    async fn goto(&mut self, url: &str) -> BrowserResult<()>;

    /// Resolve once no new network activity has been seen for `idle`, or fail
    /// with [`BrowserError::Timeout`] after `timeout`.
    async fn wait_for_network_idle(&mut self, idle: Duration, timeout: Duration)
        -> BrowserResult<()>;

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// Scroll the viewport to the bottom of the document.
    async fn scroll_to_bottom(&mut self) -> BrowserResult<()>;

    async fn pause(&mut self, duration: Duration) -> BrowserResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Serialized HTML of the document as currently rendered.
    async fn content(&mut self) -> BrowserResult<String>;

    /// Address of the document currently loaded.
    async fn url(&mut self) -> BrowserResult<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BrowserEngine {
    /// Headless Chrome/Chromium over CDP.
    #[default]
    Chromium,
    /// Plain HTTP fetches. Only suitable for server-rendered listings.
    Http,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub engine: BrowserEngine,
    pub headless: bool,
    pub chrome_executable: Option<std::path::PathBuf>,
    pub navigation_timeout: Duration,
}

/// One browser instance and the single page reused for the whole run.
pub enum BrowserSession {
    Chromium(ChromiumSession),
    Http(HttpPage),
    #[cfg(any(test, feature = "testing"))]
    Scripted(ScriptedPage),
}

impl BrowserSession {
    pub async fn launch(options: &BrowserOptions) -> BrowserResult<Self> {
        info!(engine = ?options.engine, headless = options.headless, "starting browser session");
        match options.engine {
            BrowserEngine::Chromium => Ok(Self::Chromium(ChromiumSession::launch(options).await?)),
            BrowserEngine::Http => Ok(Self::Http(HttpPage::new(options.navigation_timeout)?)),
        }
    }

    pub fn page(&mut self) -> &mut dyn BrowserPage {
        match self {
            Self::Chromium(session) => session.page(),
            Self::Http(page) => page,
            #[cfg(any(test, feature = "testing"))]
            Self::Scripted(page) => page,
        }
    }

    /// Release the browser. Must be awaited on every exit path of a run.
    pub async fn shutdown(self) {
        match self {
            Self::Chromium(session) => {
                if let Err(err) = session.shutdown().await {
                    warn!(error = %err, "browser shutdown reported an error");
                }
            }
            Self::Http(_) => {}
            #[cfg(any(test, feature = "testing"))]
            Self::Scripted(page) => page.shutdown(),
        }
    }
}

#[cfg(any(test, feature = "testing"))]
impl From<ScriptedPage> for BrowserSession {
    fn from(page: ScriptedPage) -> Self {
        Self::Scripted(page)
    }
}
