pub mod browser;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod scraping;
pub mod sink;
mod utils;

pub use config::AppConfig;
pub use models::Gig;
pub use pipeline::{run_scraper, Orchestrator, RunSummary};

/// Location of the config file used when none is given.
pub fn default_config_path() -> std::path::PathBuf {
    utils::config_path()
}
