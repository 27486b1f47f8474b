pub mod config;
pub mod converge;
pub mod identity;
pub mod list;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cpanel_api::config::loader::load_config;
use cpanel_api::{CpanelClient, DynGateway};
use cpanel_reconcile::{
    CronJobReconciler, CronJobs, DatabaseReconciler, Databases, Reconciler, UserReconciler, Users,
};

/// One reconciler per resource kind, sharing a single gateway.
pub struct Session {
    pub cron_jobs: CronJobReconciler,
    pub databases: DatabaseReconciler,
    pub users: UserReconciler,
}

impl Session {
    pub fn new(gateway: DynGateway) -> Self {
        Self {
            cron_jobs: Reconciler::new(gateway.clone(), CronJobs),
            databases: Reconciler::new(gateway.clone(), Databases),
            users: Reconciler::new(gateway, Users),
        }
    }

    /// Loads gateway settings and builds the HTTP client.
    pub fn connect(config_path: &Path) -> Result<Self> {
        let config = load_config(Some(config_path)).context("Failed to load gateway configuration")?;
        let client = CpanelClient::new(&config).context("Failed to build HTTP client")?;
        tracing::debug!(host = %config.host, user = %config.username, "Connected gateway");
        Ok(Self::new(Arc::new(client)))
    }
}
