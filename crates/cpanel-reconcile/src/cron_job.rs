//! Scheduled jobs (crontab lines).
//!
//! Line keys renumber whenever the crontab changes, so jobs are matched by
//! the content identity of their six fields. Every mutation targets the
//! line key from the snapshot read immediately before it.

use async_trait::async_trait;
use cpanel_api::cron::FIELDS;
use cpanel_api::{Fields, Gateway, ObservedRecord, RemoteKey, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayResultExt, ReconcileError};
use crate::identity::Identity;
use crate::reconciler::ResourceHandler;

/// Accepted weekday values.
pub const WEEKDAYS: [&str; 9] = ["0", "1", "2", "3", "4", "5", "6", "7", "*"];

/// Desired state of one crontab line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronJobSpec {
    pub minute: String,
    pub hour: String,
    pub day: String,
    pub weekday: String,
    pub month: String,
    pub command: String,
}

impl CronJobSpec {
    /// Field values in identity order.
    pub fn values(&self) -> [&str; 6] {
        [
            self.minute.as_str(),
            self.hour.as_str(),
            self.day.as_str(),
            self.weekday.as_str(),
            self.month.as_str(),
            self.command.as_str(),
        ]
    }

    pub fn identity(&self) -> Identity {
        Identity::resolve(&self.values())
    }

    pub fn to_fields(&self) -> Fields {
        FIELDS
            .iter()
            .zip(self.values())
            .map(|(name, value)| ((*name).to_string(), value.to_string()))
            .collect()
    }

    /// Reads the schedule back from an observed line.
    pub fn from_record(record: &ObservedRecord) -> Self {
        Self {
            minute: record.field("minute").to_string(),
            hour: record.field("hour").to_string(),
            day: record.field("day").to_string(),
            weekday: record.field("weekday").to_string(),
            month: record.field("month").to_string(),
            command: record.field("command").to_string(),
        }
    }
}

/// Handler for [`ResourceKind::CronJob`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CronJobs;

fn line_key(
    observed: &ObservedRecord,
    identity: &Identity,
) -> Result<RemoteKey, ReconcileError> {
    observed.key.clone().ok_or_else(|| {
        ReconcileError::validation(
            ResourceKind::CronJob,
            identity,
            "observed crontab line has no line key",
        )
    })
}

#[async_trait]
impl ResourceHandler for CronJobs {
    type Spec = CronJobSpec;

    fn kind(&self) -> ResourceKind {
        ResourceKind::CronJob
    }

    fn identity(&self, spec: &CronJobSpec) -> Identity {
        spec.identity()
    }

    fn record_identity(&self, record: &ObservedRecord) -> Identity {
        CronJobSpec::from_record(record).identity()
    }

    fn validate(&self, spec: &CronJobSpec) -> Result<(), ReconcileError> {
        let identity = spec.identity();
        for (name, value) in FIELDS.iter().zip(spec.values()) {
            if value.trim().is_empty() {
                return Err(ReconcileError::validation(
                    self.kind(),
                    &identity,
                    format!("`{name}` must not be empty"),
                ));
            }
        }
        if !WEEKDAYS.contains(&spec.weekday.as_str()) {
            return Err(ReconcileError::validation(
                self.kind(),
                &identity,
                format!(
                    "`weekday` must be one of {}, got `{}`",
                    WEEKDAYS.join(", "),
                    spec.weekday
                ),
            ));
        }
        Ok(())
    }

    // A record found under the desired identity has identical fields.
    fn in_sync(
        &self,
        desired: &CronJobSpec,
        _prior: Option<&CronJobSpec>,
        observed: &ObservedRecord,
    ) -> bool {
        self.record_identity(observed) == desired.identity()
    }

    async fn create(
        &self,
        gateway: &dyn Gateway,
        spec: &CronJobSpec,
    ) -> Result<ObservedRecord, ReconcileError> {
        gateway
            .create_one(self.kind(), &spec.to_fields())
            .await
            .for_resource(self.kind(), &spec.identity())
    }

    async fn update(
        &self,
        gateway: &dyn Gateway,
        desired: &CronJobSpec,
        observed: &ObservedRecord,
    ) -> Result<ObservedRecord, ReconcileError> {
        let identity = desired.identity();
        let key = line_key(observed, &identity)?;
        gateway
            .update_one(self.kind(), &key, &desired.to_fields())
            .await
            .for_resource(self.kind(), &identity)
    }

    async fn delete(
        &self,
        gateway: &dyn Gateway,
        observed: &ObservedRecord,
    ) -> Result<(), ReconcileError> {
        let identity = self.record_identity(observed);
        let key = line_key(observed, &identity)?;
        gateway
            .delete_one(self.kind(), &key)
            .await
            .for_resource(self.kind(), &identity)
    }
}
