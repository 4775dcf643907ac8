//! Harvest-then-extract run over a single browser page.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::browser::{BrowserPage, BrowserSession};
use crate::config::AppConfig;
use crate::models::Gig;
use crate::scraping::{self, DetailExtractor, LinkHarvester, VenueScraper};
use crate::sink::{self, GigSink, JsonFileSink};

/// What a run harvested and extracted, before persistence.
#[derive(Debug)]
pub struct Collected {
    pub links_harvested: usize,
    pub gigs: Vec<Gig>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub venue: String,
    pub endpoint: String,
    pub links_harvested: usize,
    pub gigs_extracted: usize,
    pub links_failed: usize,
    /// Where the gigs were written, if anything was written.
    pub output: Option<String>,
}

pub struct Orchestrator {
    venue: Box<dyn VenueScraper>,
    endpoint: String,
    harvester: LinkHarvester,
    network_idle: Duration,
    navigation_timeout: Duration,
    listing_wait: Duration,
}

impl Orchestrator {
    pub fn new(venue: Box<dyn VenueScraper>, config: &AppConfig) -> Self {
        let endpoint = config.endpoint_for(venue.as_ref());
        Self {
            venue,
            endpoint,
            harvester: LinkHarvester::new(config.harvest_config()),
            network_idle: config.network_idle(),
            navigation_timeout: config.navigation_timeout(),
            listing_wait: config.listing_wait(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let venue = scraping::find_venue(&config.venue)
            .ok_or_else(|| anyhow!("unknown venue id: {}", config.venue))?;
        Ok(Self::new(venue, config))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open the listing, harvest its links and extract each one in order.
    ///
    /// Failing to open the listing is fatal; failures while harvesting or on a
    /// single detail page are not.
    pub async fn collect(&self, page: &mut dyn BrowserPage) -> Result<Collected> {
        let selector = self.venue.link_selector();
        info!(venue = self.venue.venue_id(), endpoint = %self.endpoint, "opening listing");
        page.goto(&self.endpoint)
            .await
            .with_context(|| format!("failed to open listing {}", self.endpoint))?;
        page.wait_for_network_idle(self.network_idle, self.navigation_timeout)
            .await
            .with_context(|| format!("listing {} never settled", self.endpoint))?;
        if let Err(err) = page.wait_for_selector(selector, self.listing_wait).await {
            warn!(selector, error = %err, "no event links on listing");
        }

        let links = self.harvester.harvest(page, selector).await;
        let links_harvested = links.len();

        let extractor = DetailExtractor::new(
            self.venue.detail_layout(),
            self.network_idle,
            self.navigation_timeout,
        );
        let mut gigs = Vec::with_capacity(links_harvested);
        for link in links {
            if let Some(gig) = extractor.extract(page, &link).await {
                gigs.push(gig);
            }
        }
        info!(
            gigs = gigs.len(),
            links = links_harvested,
            "scraped event details"
        );

        Ok(Collected {
            links_harvested,
            gigs,
        })
    }

    /// Run inside `session`, release it whatever the outcome, then persist.
    pub async fn run_in_session(
        &self,
        mut session: BrowserSession,
        sink: &dyn GigSink,
    ) -> Result<RunSummary> {
        let collected = self.collect(session.page()).await;
        session.shutdown().await;
        let collected = collected?;

        let written = sink::deliver(&collected.gigs, sink)?;
        Ok(RunSummary {
            venue: self.venue.venue_id().to_string(),
            endpoint: self.endpoint.clone(),
            links_harvested: collected.links_harvested,
            gigs_extracted: collected.gigs.len(),
            links_failed: collected.links_harvested - collected.gigs.len(),
            output: written.then(|| sink.describe()),
        })
    }
}

/// Start one complete run as described by `config`.
pub async fn run_scraper(config: &AppConfig) -> Result<RunSummary> {
    let orchestrator = Orchestrator::from_config(config)?;
    let sink = JsonFileSink::new(config.output.clone());
    let session = BrowserSession::launch(&config.browser_options())
        .await
        .context("failed to launch browser")?;
    orchestrator.run_in_session(session, &sink).await
}
