use std::collections::HashSet;
use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::base;
use crate::browser::{BrowserError, BrowserPage, BrowserResult};

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Pause after each scroll so lazily loaded items can render.
    pub settle_interval: Duration,
    /// Upper bound on scrolls, for listings that never stop growing.
    pub max_scroll_rounds: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            settle_interval: Duration::from_millis(2000),
            max_scroll_rounds: 50,
        }
    }
}

/// Unique detail-page addresses in discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LinkSet {
    /// Returns `true` if `link` was not present yet.
    pub fn insert(&mut self, link: String) -> bool {
        if self.seen.insert(link.clone()) {
            self.ordered.push(link);
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.seen.contains(link)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.ordered.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

impl IntoIterator for LinkSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.into_iter()
    }
}

pub struct LinkHarvester {
    config: HarvestConfig,
}

impl LinkHarvester {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Scroll the listing until a query turns up no new links.
    ///
    /// Errors end harvesting early; whatever was collected up to that point is
    /// returned.
    pub async fn harvest(&self, page: &mut dyn BrowserPage, selector: &str) -> LinkSet {
        let mut links = LinkSet::default();
        if let Err(err) = self.scroll_and_collect(page, selector, &mut links).await {
            warn!(
                error = %err,
                collected = links.len(),
                "error during dynamic scroll and link collection"
            );
        }
        info!(links = links.len(), "collected event links");
        links
    }

    async fn scroll_and_collect(
        &self,
        page: &mut dyn BrowserPage,
        selector: &str,
        links: &mut LinkSet,
    ) -> BrowserResult<()> {
        let parsed = Selector::parse(selector)
            .map_err(|err| BrowserError::Selector(format!("{selector}: {err:?}")))?;

        let mut round = 0;
        loop {
            let previous = links.len();
            let html = page.content().await?;
            let base_url = page.url().await?;
            for link in collect_links(&html, &base_url, &parsed) {
                links.insert(link);
            }
            debug!(
                round,
                added = links.len() - previous,
                total = links.len(),
                "harvest round"
            );

            if links.len() == previous {
                return Ok(());
            }
            if round >= self.config.max_scroll_rounds {
                warn!(
                    rounds = round,
                    total = links.len(),
                    "listing still growing at scroll cap, stopping"
                );
                return Ok(());
            }

            page.scroll_to_bottom().await?;
            page.pause(self.config.settle_interval).await?;
            round += 1;
        }
    }
}

/// Resolved `href`s of every element in `html` matching `selector`.
pub fn collect_links(html: &str, base_url: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .filter_map(|el| base::absolute_url(base_url, el.value().attr("href").map(str::to_string)))
        .collect()
}
