use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::error::{BrowserError, BrowserResult};
use super::BrowserPage;

const USER_AGENT: &str = "GigScrape/0.1 (+https://github.com/gig-scrape/gig-scrape)";

/// Static page driver backed by plain HTTP requests.
///
/// Nothing is executed client side: scrolling is a no-op and the network is
/// idle as soon as the body has been read, so harvesting converges after a
/// single query.
pub struct HttpPage {
    client: Client,
    current_url: Option<String>,
    body: String,
}

impl HttpPage {
    pub fn new(timeout: Duration) -> BrowserResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            current_url: None,
            body: String::new(),
        })
    }
}

#[async_trait]
impl BrowserPage for HttpPage {
    async fn goto(&mut self, url: &str) -> BrowserResult<()> {
        debug!(url, "fetching");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| BrowserError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            })?
            .error_for_status()?;
        let final_url = response.url().to_string();
        self.body = response.text().await?;
        self.current_url = Some(final_url);
        Ok(())
    }

    async fn wait_for_network_idle(
        &mut self,
        _idle: Duration,
        _timeout: Duration,
    ) -> BrowserResult<()> {
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, _timeout: Duration) -> BrowserResult<()> {
        let parsed = Selector::parse(selector)
            .map_err(|err| BrowserError::Selector(format!("{selector}: {err:?}")))?;
        let document = Html::parse_document(&self.body);
        if document.select(&parsed).next().is_some() {
            Ok(())
        } else {
            // A static body will never change, so there is nothing to wait for.
            Err(BrowserError::Timeout(format!("selector `{selector}`")))
        }
    }

    async fn scroll_to_bottom(&mut self) -> BrowserResult<()> {
        Ok(())
    }

    async fn pause(&mut self, _duration: Duration) -> BrowserResult<()> {
        Ok(())
    }

    async fn content(&mut self) -> BrowserResult<String> {
        Ok(self.body.clone())
    }

    async fn url(&mut self) -> BrowserResult<String> {
        self.current_url
            .clone()
            .ok_or_else(|| BrowserError::Unexpected("no page loaded".to_string()))
    }
}
