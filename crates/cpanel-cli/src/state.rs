//! Last applied state, one entry per manifest label.
//!
//! This is the prior state handed to each convergence, never a cache of
//! the host: every step re-reads the remote collection. The file holds user
//! passwords and should be kept private.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cpanel_reconcile::{Applied, CronJobSpec, DatabaseSpec, UserSpec};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cron_job: BTreeMap<String, Applied<CronJobSpec>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub database: BTreeMap<String, Applied<DatabaseSpec>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user: BTreeMap<String, Applied<UserSpec>>,
}

impl State {
    /// Loads the state file. A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Corrupt state file {}", path.display()))
    }

    /// Writes through a temporary file so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("Cannot write state file {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Cannot replace state file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Saved state");
        Ok(())
    }
}
