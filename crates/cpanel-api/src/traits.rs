//! The gateway contract consumed by the reconciliation core.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{Fields, ObservedRecord, RemoteKey, ResourceKind};

/// Executes one remote call at a time against the control-panel host.
///
/// Every call performs exactly one round trip and reports remote failure
/// through [`GatewayError::Rejected`]. Implementations must be thread-safe
/// (`Send + Sync`) since independent resources may be converged concurrently.
///
/// # Example
///
/// ```ignore
/// use cpanel_api::{Gateway, GatewayError, ResourceKind};
///
/// async fn database_names(gateway: &dyn Gateway) -> Result<Vec<String>, GatewayError> {
///     let records = gateway.list_all(ResourceKind::Database).await?;
///     Ok(records.iter().map(|r| r.field("name").to_string()).collect())
/// }
/// ```
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Returns the full snapshot of a resource collection. No pagination.
    async fn list_all(&self, kind: ResourceKind) -> Result<Vec<ObservedRecord>, GatewayError>;

    /// Creates one resource from its fields.
    ///
    /// The returned record carries the remote-assigned key, if any.
    async fn create_one(
        &self,
        kind: ResourceKind,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError>;

    /// Updates mutable fields of an existing resource in place.
    async fn update_one(
        &self,
        kind: ResourceKind,
        key: &RemoteKey,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError>;

    /// Renames an existing resource.
    ///
    /// `fields` carry the new name and any mutable fields the remote system
    /// updates atomically with the rename.
    async fn rename_one(
        &self,
        kind: ResourceKind,
        key: &RemoteKey,
        fields: &Fields,
    ) -> Result<ObservedRecord, GatewayError>;

    /// Deletes one resource by its remote key.
    async fn delete_one(&self, kind: ResourceKind, key: &RemoteKey) -> Result<(), GatewayError>;

    /// Grants `member` all privileges on `owner`.
    async fn grant(&self, owner: &str, member: &str) -> Result<(), GatewayError>;

    /// Revokes all privileges of `member` on `owner`.
    async fn revoke(&self, owner: &str, member: &str) -> Result<(), GatewayError>;
}
