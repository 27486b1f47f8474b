//! PostgreSQL databases and their user privileges.

use std::collections::BTreeSet;

use async_trait::async_trait;
use cpanel_api::{Fields, Gateway, ObservedRecord, RemoteKey, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayResultExt, ReconcileError};
use crate::identity::Identity;
use crate::membership::{MembershipSet, reconcile_membership};
use crate::reconciler::ResourceHandler;

/// Desired state of one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub name: String,
    /// Users granted all privileges on the database.
    #[serde(default)]
    pub users: Vec<String>,
}

impl DatabaseSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.users = users.into_iter().map(Into::into).collect();
        self
    }

    fn membership(&self) -> Result<MembershipSet, ReconcileError> {
        MembershipSet::from_members(&self.name, self.users.iter().cloned()).map_err(|e| {
            ReconcileError::validation(ResourceKind::Database, &self.identity(), e.to_string())
        })
    }

    pub fn identity(&self) -> Identity {
        Identity::natural(&self.name)
    }

    fn name_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.name.clone());
        fields
    }
}

/// Handler for [`ResourceKind::Database`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Databases;

#[async_trait]
impl ResourceHandler for Databases {
    type Spec = DatabaseSpec;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    fn identity(&self, spec: &DatabaseSpec) -> Identity {
        spec.identity()
    }

    fn record_identity(&self, record: &ObservedRecord) -> Identity {
        Identity::natural(record.field("name"))
    }

    fn validate(&self, spec: &DatabaseSpec) -> Result<(), ReconcileError> {
        if spec.name.trim().is_empty() {
            return Err(ReconcileError::validation(
                self.kind(),
                &spec.identity(),
                "`name` must not be empty",
            ));
        }
        spec.membership().map(|_| ())
    }

    fn in_sync(
        &self,
        desired: &DatabaseSpec,
        _prior: Option<&DatabaseSpec>,
        observed: &ObservedRecord,
    ) -> bool {
        let observed_users: BTreeSet<&str> = observed.members.iter().map(String::as_str).collect();
        let desired_users: BTreeSet<&str> = desired.users.iter().map(String::as_str).collect();
        observed.field("name") == desired.name && observed_users == desired_users
    }

    fn is_rename(&self, desired: &DatabaseSpec, observed: &ObservedRecord) -> bool {
        observed.field("name") != desired.name
    }

    async fn create(
        &self,
        gateway: &dyn Gateway,
        spec: &DatabaseSpec,
    ) -> Result<ObservedRecord, ReconcileError> {
        let desired = spec.membership()?;
        let record = gateway
            .create_one(self.kind(), &spec.name_fields())
            .await
            .for_resource(self.kind(), &spec.identity())?;
        reconcile_membership(gateway, &spec.name, &desired, &MembershipSet::new()).await?;
        Ok(record.with_members(desired.members()))
    }

    async fn update(
        &self,
        gateway: &dyn Gateway,
        desired: &DatabaseSpec,
        observed: &ObservedRecord,
    ) -> Result<ObservedRecord, ReconcileError> {
        let identity = desired.identity();
        let members = desired.membership()?;

        let record = if self.is_rename(desired, observed) {
            let old_name = RemoteKey::Name(observed.field("name").to_string());
            let renamed = gateway
                .rename_one(self.kind(), &old_name, &desired.name_fields())
                .await
                .for_resource(self.kind(), &identity)?;
            tracing::info!(from = %old_name, to = %desired.name, "Renamed database");
            renamed
        } else {
            ObservedRecord::new(
                Some(RemoteKey::Name(desired.name.clone())),
                desired.name_fields(),
            )
        };

        // Privileges follow the database across a rename.
        let current = MembershipSet::observed(&desired.name, observed.members.iter().cloned());
        reconcile_membership(gateway, &desired.name, &members, &current).await?;
        Ok(record.with_members(members.members()))
    }

    async fn delete(
        &self,
        gateway: &dyn Gateway,
        observed: &ObservedRecord,
    ) -> Result<(), ReconcileError> {
        let name = observed.field("name");
        gateway
            .delete_one(self.kind(), &RemoteKey::Name(name.to_string()))
            .await
            .for_resource(self.kind(), &Identity::natural(name))
    }
}
