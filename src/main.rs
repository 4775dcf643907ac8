//! gig-scrape - venue calendar scraper.
//!
//! Opens a venue listing in a browser, follows every event link and writes
//! the extracted gigs to a JSON file.

mod cli;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let default_filter = if cli::is_verbose() {
        "gig_scrape=debug,gig_scrape_lib=debug"
    } else {
        "gig_scrape=info,gig_scrape_lib=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
