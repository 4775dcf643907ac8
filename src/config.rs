use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::browser::{BrowserEngine, BrowserOptions};
use crate::scraping::{HarvestConfig, VenueScraper};
use crate::utils;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub venue: String,
    /// Listing address; falls back to the venue's own URL.
    pub endpoint: Option<String>,
    pub output: PathBuf,
    pub engine: BrowserEngine,
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    pub settle_interval_ms: u64,
    pub max_scroll_rounds: usize,
    pub network_idle_ms: u64,
    pub navigation_timeout_secs: u64,
    pub listing_wait_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            venue: "house_of_yes".to_string(),
            endpoint: None,
            output: PathBuf::from("events.json"),
            engine: BrowserEngine::default(),
            headless: true,
            chrome_executable: None,
            settle_interval_ms: 2000,
            max_scroll_rounds: 50,
            network_idle_ms: 500,
            navigation_timeout_secs: 30,
            listing_wait_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location. A missing file yields
    /// the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(utils::config_path);
        read_config(&path)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(utils::config_path);
        write_config(&path, self)?;
        Ok(path)
    }

    pub fn endpoint_for(&self, venue: &dyn VenueScraper) -> String {
        self.endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .unwrap_or_else(|| venue.venue_url().to_string())
    }

    pub fn harvest_config(&self) -> HarvestConfig {
        HarvestConfig {
            settle_interval: Duration::from_millis(self.settle_interval_ms),
            max_scroll_rounds: self.max_scroll_rounds,
        }
    }

    pub fn browser_options(&self) -> BrowserOptions {
        BrowserOptions {
            engine: self.engine,
            headless: self.headless,
            chrome_executable: self.chrome_executable.clone(),
            navigation_timeout: self.navigation_timeout(),
        }
    }

    pub fn network_idle(&self) -> Duration {
        Duration::from_millis(self.network_idle_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn listing_wait(&self) -> Duration {
        Duration::from_secs(self.listing_wait_secs)
    }
}

fn read_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn write_config(path: &Path, config: &AppConfig) -> Result<()> {
    utils::ensure_parent(path)?;
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)
        .with_context(|| format!("unable to write config {}", path.display()))
}
