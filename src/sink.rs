use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::models::Gig;
use crate::utils;

/// Receives the finished gig list of a run, all at once.
pub trait GigSink {
    fn persist(&self, gigs: &[Gig]) -> Result<()>;
    fn describe(&self) -> String;
}

/// Writes the list as a pretty-printed JSON array.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GigSink for JsonFileSink {
    fn persist(&self, gigs: &[Gig]) -> Result<()> {
        utils::ensure_parent(&self.path)
            .with_context(|| format!("unable to create parent of {}", self.path.display()))?;
        let contents = serde_json::to_string_pretty(gigs).context("gig serialization failed")?;

        // Written beside the target and renamed so readers never see half a file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents)
            .with_context(|| format!("unable to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("unable to move output into {}", self.path.display()))?;

        info!(path = %self.path.display(), gigs = gigs.len(), "data saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Hand `gigs` to `sink` unless there is nothing to save.
/// Returns whether the sink was invoked.
pub fn deliver(gigs: &[Gig], sink: &dyn GigSink) -> Result<bool> {
    if gigs.is_empty() {
        info!("no data to save");
        return Ok(false);
    }
    sink.persist(gigs)
        .with_context(|| format!("failed to persist gigs to {}", sink.describe()))?;
    Ok(true)
}
