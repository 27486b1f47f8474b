//! PostgreSQL users.
//!
//! Passwords are write-only on the remote side, so drift in a password
//! cannot be observed. It is compared against the last applied spec instead.

use std::fmt;

use async_trait::async_trait;
use cpanel_api::{Fields, Gateway, ObservedRecord, RemoteKey, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayResultExt, ReconcileError};
use crate::identity::Identity;
use crate::reconciler::ResourceHandler;

/// Desired state of one database user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    pub name: String,
    pub password: String,
}

impl UserSpec {
    pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::natural(&self.name)
    }

    fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.name.clone());
        fields.insert("password".to_string(), self.password.clone());
        fields
    }
}

impl fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSpec")
            .field("name", &self.name)
            .field("password", &"***")
            .finish()
    }
}

/// Handler for [`ResourceKind::User`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Users;

#[async_trait]
impl ResourceHandler for Users {
    type Spec = UserSpec;

    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn identity(&self, spec: &UserSpec) -> Identity {
        spec.identity()
    }

    fn record_identity(&self, record: &ObservedRecord) -> Identity {
        Identity::natural(record.field("name"))
    }

    fn validate(&self, spec: &UserSpec) -> Result<(), ReconcileError> {
        if spec.name.trim().is_empty() {
            return Err(ReconcileError::validation(
                self.kind(),
                &spec.identity(),
                "`name` must not be empty",
            ));
        }
        if spec.password.is_empty() {
            return Err(ReconcileError::validation(
                self.kind(),
                &spec.identity(),
                "`password` must not be empty",
            ));
        }
        Ok(())
    }

    // Without a prior spec the password is unknown and gets reset.
    fn in_sync(
        &self,
        desired: &UserSpec,
        prior: Option<&UserSpec>,
        observed: &ObservedRecord,
    ) -> bool {
        observed.field("name") == desired.name
            && prior.is_some_and(|p| p.password == desired.password)
    }

    fn is_rename(&self, desired: &UserSpec, observed: &ObservedRecord) -> bool {
        observed.field("name") != desired.name
    }

    async fn create(
        &self,
        gateway: &dyn Gateway,
        spec: &UserSpec,
    ) -> Result<ObservedRecord, ReconcileError> {
        gateway
            .create_one(self.kind(), &spec.to_fields())
            .await
            .for_resource(self.kind(), &spec.identity())
    }

    async fn update(
        &self,
        gateway: &dyn Gateway,
        desired: &UserSpec,
        observed: &ObservedRecord,
    ) -> Result<ObservedRecord, ReconcileError> {
        let identity = desired.identity();
        let current = RemoteKey::Name(observed.field("name").to_string());
        let fields = desired.to_fields();

        // rename_user resets the password in the same call.
        if self.is_rename(desired, observed) {
            let record = gateway
                .rename_one(self.kind(), &current, &fields)
                .await
                .for_resource(self.kind(), &identity)?;
            tracing::info!(from = %current, to = %desired.name, "Renamed user");
            Ok(record)
        } else {
            gateway
                .update_one(self.kind(), &current, &fields)
                .await
                .for_resource(self.kind(), &identity)
        }
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
