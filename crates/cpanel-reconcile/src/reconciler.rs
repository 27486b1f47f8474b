//! Generic convergence of one resource instance.
//!
//! A [`Reconciler`] pairs a shared gateway with a kind-specific
//! [`ResourceHandler`]. Each call to [`Reconciler::converge`] takes the
//! desired spec and the previously applied spec, reads the remote collection
//! fresh, and issues at most the minimal sequence of mutations needed.

use std::fmt;

use async_trait::async_trait;
use cpanel_api::{DynGateway, Gateway, ObservedRecord, RemoteKey, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayResultExt, ReconcileError};
use crate::identity::Identity;

/// Kind-specific behaviour plugged into a [`Reconciler`].
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The desired state of one instance.
    type Spec: Clone + fmt::Debug + PartialEq + Send + Sync;

    fn kind(&self) -> ResourceKind;

    /// Identity of a desired spec.
    fn identity(&self, spec: &Self::Spec) -> Identity;

    /// Identity of an observed record, comparable with [`Self::identity`].
    fn record_identity(&self, record: &ObservedRecord) -> Identity;

    /// Local checks run before any remote call.
    fn validate(&self, _spec: &Self::Spec) -> Result<(), ReconcileError> {
        Ok(())
    }

    /// Whether the observed record already matches `desired`.
    ///
    /// `prior` is the last applied spec, consulted for fields the remote
    /// system never reports back.
    fn in_sync(
        &self,
        desired: &Self::Spec,
        prior: Option<&Self::Spec>,
        observed: &ObservedRecord,
    ) -> bool;

    /// Whether updating `observed` to `desired` changes its natural key.
    fn is_rename(&self, _desired: &Self::Spec, _observed: &ObservedRecord) -> bool {
        false
    }

    async fn create(
        &self,
        gateway: &dyn Gateway,
        spec: &Self::Spec,
    ) -> Result<ObservedRecord, ReconcileError>;

    async fn update(
        &self,
        gateway: &dyn Gateway,
        desired: &Self::Spec,
        observed: &ObservedRecord,
    ) -> Result<ObservedRecord, ReconcileError>;

    async fn delete(
        &self,
        gateway: &dyn Gateway,
        observed: &ObservedRecord,
    ) -> Result<(), ReconcileError>;
}

/// What convergence will do (or did) for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Noop,
    Create,
    Update { rename: bool },
    Delete,
}

impl Action {
    /// True for every action that mutates remote state.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Noop)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => write!(f, "no-op"),
            Self::Create => write!(f, "create"),
            Self::Update { rename: true } => write!(f, "rename"),
            Self::Update { rename: false } => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// The decision for one instance together with the record it was based on.
#[derive(Debug, Clone)]
pub struct Plan {
    pub action: Action,
    pub identity: Identity,
    pub observed: Option<ObservedRecord>,
}

/// State recorded after a successful convergence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applied<S> {
    pub spec: S,
    /// Remote key captured on the last write. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<RemoteKey>,
}

/// Result of [`Reconciler::converge`].
#[derive(Debug, Clone)]
pub struct Outcome<S> {
    pub action: Action,
    pub identity: Identity,
    /// `None` once the instance no longer exists.
    pub applied: Option<Applied<S>>,
}

/// Converges instances of one resource kind.
pub struct Reconciler<H> {
    gateway: DynGateway,
    handler: H,
}

impl<H: ResourceHandler> Reconciler<H> {
    pub fn new(gateway: DynGateway, handler: H) -> Self {
        Self { gateway, handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn kind(&self) -> ResourceKind {
        self.handler.kind()
    }

    /// Fetches a fresh snapshot and returns the record matching `spec`.
    pub async fn read(&self, spec: &H::Spec) -> Result<Option<ObservedRecord>, ReconcileError> {
        let identity = self.handler.identity(spec);
        let records = self
            .gateway
            .list_all(self.kind())
            .await
            .for_resource(self.kind(), &identity)?;
        Ok(records
            .into_iter()
            .find(|record| self.handler.record_identity(record) == identity))
    }

    /// Lists every remote instance of this kind.
    pub async fn list(&self) -> Result<Vec<ObservedRecord>, ReconcileError> {
        self.gateway
            .list_all(self.kind())
            .await
            .for_resource(self.kind(), &Identity::natural("*"))
    }

    pub async fn create(&self, spec: &H::Spec) -> Result<ObservedRecord, ReconcileError> {
        self.handler.validate(spec)?;
        let identity = self.handler.identity(spec);
        let record = self.handler.create(self.gateway.as_ref(), spec).await?;
        tracing::info!(kind = %self.kind(), identity = %identity, key = ?record.key, "Created resource");
        Ok(record)
    }

    pub async fn update(
        &self,
        desired: &H::Spec,
        observed: &ObservedRecord,
    ) -> Result<ObservedRecord, ReconcileError> {
        self.handler.validate(desired)?;
        let identity = self.handler.identity(desired);
        let record = self
            .handler
            .update(self.gateway.as_ref(), desired, observed)
            .await?;
        tracing::info!(kind = %self.kind(), identity = %identity, key = ?record.key, "Updated resource");
        Ok(record)
    }

    /// Deletes the instance described by `prior`, if it still exists.
    pub async fn delete(&self, prior: &H::Spec) -> Result<bool, ReconcileError> {
        let identity = self.handler.identity(prior);
        match self.read(prior).await? {
            Some(observed) => {
                self.remove(&identity, &observed).await?;
                Ok(true)
            }
            None => {
                tracing::debug!(kind = %self.kind(), identity = %identity, "Already absent");
                Ok(false)
            }
        }
    }

    async fn remove(
        &self,
        identity: &Identity,
        observed: &ObservedRecord,
    ) -> Result<(), ReconcileError> {
        self.handler.delete(self.gateway.as_ref(), observed).await?;
        tracing::info!(kind = %self.kind(), identity = %identity, "Deleted resource");
        Ok(())
    }

    /// Decides what [`converge`](Self::converge) would do without mutating.
    pub async fn plan(
        &self,
        desired: Option<&H::Spec>,
        prior: Option<&H::Spec>,
    ) -> Result<Plan, ReconcileError> {
        if let Some(spec) = desired {
            self.handler.validate(spec)?;
        }

        match (desired, prior) {
            (None, None) => Ok(Plan {
                action: Action::Noop,
                identity: Identity::natural(""),
                observed: None,
            }),
            (None, Some(prior)) => {
                let observed = self.read(prior).await?;
                let action = if observed.is_some() {
                    Action::Delete
                } else {
                    Action::Noop
                };
                Ok(Plan {
                    action,
                    identity: self.handler.identity(prior),
                    observed,
                })
            }
            (Some(desired), prior) => {
                let identity = self.handler.identity(desired);
                // Prior state only counts while its record still exists.
                let (observed, prior) = match prior {
                    Some(prior) => match self.read(prior).await? {
                        Some(record) => (Some(record), Some(prior)),
                        None if self.handler.identity(prior) == identity => (None, None),
                        None => (self.read(desired).await?, None),
                    },
                    None => (self.read(desired).await?, None),
                };

                let action = match &observed {
                    None => Action::Create,
                    Some(record) if self.handler.in_sync(desired, prior, record) => Action::Noop,
                    Some(record) => Action::Update {
                        rename: self.handler.is_rename(desired, record),
                    },
                };
                Ok(Plan {
                    action,
                    identity,
                    observed,
                })
            }
        }
    }

    /// Drives one instance toward `desired`.
    ///
    /// `desired = None` removes the instance recorded in `prior`. Failures
    /// are returned immediately; earlier mutations are not rolled back.
    pub async fn converge(
        &self,
        desired: Option<&H::Spec>,
        prior: Option<&H::Spec>,
    ) -> Result<Outcome<H::Spec>, ReconcileError> {
        let plan = self.plan(desired, prior).await?;
        tracing::debug!(kind = %self.kind(), identity = %plan.identity, action = %plan.action, "Planned");

        let key = match (plan.action, desired, plan.observed.as_ref()) {
            (Action::Create, Some(spec), _) => self.create(spec).await?.key,
            (Action::Update { .. }, Some(spec), Some(observed)) => {
                self.update(spec, observed).await?.key
            }
            (Action::Delete, _, Some(observed)) => {
                self.remove(&plan.identity, observed).await?;
                None
            }
            (_, _, observed) => observed.and_then(|o| o.key.clone()),
        };

        Ok(Outcome {
            action: plan.action,
            identity: plan.identity,
            applied: desired.map(|spec| Applied {
                spec: spec.clone(),
                key,
            }),
        })
    }
}
