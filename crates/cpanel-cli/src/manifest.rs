//! Desired-state manifest.
//!
//! ```toml
//! [gateway]
//! host = "https://cpanel.example.com:2083"
//!
//! [user.app]
//! name = "app"
//! password = "s3cret"
//!
//! [database.main]
//! name = "app_db"
//! users = ["app"]
//!
//! [cron_job.nightly]
//! minute = "0"
//! hour = "3"
//! day = "*"
//! weekday = "*"
//! month = "*"
//! command = "pg_dump app_db > /backups/app.sql"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cpanel_reconcile::{CronJobSpec, DatabaseSpec, UserSpec};
use serde::Deserialize;

/// Resources keyed by their manifest label.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub cron_job: BTreeMap<String, CronJobSpec>,
    #[serde(default)]
    pub database: BTreeMap<String, DatabaseSpec>,
    #[serde(default)]
    pub user: BTreeMap<String, UserSpec>,
    /// Read by the gateway config loader, not here.
    #[serde(default)]
    pub gateway: Option<toml::Table>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read manifest {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
