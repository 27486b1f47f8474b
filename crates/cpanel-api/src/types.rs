//! Request and record types exchanged with the gateway.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// The resource kinds managed through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A crontab line, served by the API2 `Cron` module.
    CronJob,
    /// A PostgreSQL database, served by the UAPI `Postgresql` module.
    Database,
    /// A PostgreSQL user, served by the UAPI `Postgresql` module.
    User,
}

impl ResourceKind {
    /// Returns the canonical resource type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CronJob => "cron_job",
            Self::Database => "postgresql_database",
            Self::User => "postgresql_user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic fields of a resource, in declaration order.
///
/// Order is significant: content identities are computed over the values in
/// the order they were inserted.
pub type Fields = IndexMap<String, String>;

/// Looks up a required field, failing with `InvalidRequest` when absent.
pub fn required_field<'a>(fields: &'a Fields, name: &str) -> Result<&'a str, GatewayError> {
    fields
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| GatewayError::invalid_request(format!("missing field `{name}`")))
}

/// The remote system's own key for a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteKey {
    /// Positional crontab line key. Renumbers when other lines change.
    Line(i64),
    /// A natural name key (database or user name).
    Name(String),
}

impl fmt::Display for RemoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "{line}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// One entry of a remote collection snapshot.
///
/// Re-fetched on every read and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObservedRecord {
    /// Remote-assigned key, when the remote system exposes one.
    pub key: Option<RemoteKey>,
    /// Semantic fields as reported by the remote system.
    pub fields: Fields,
    /// Members related to this record (users granted on a database).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

impl ObservedRecord {
    /// Creates a record from a key and its fields.
    #[must_use]
    pub fn new(key: Option<RemoteKey>, fields: Fields) -> Self {
        Self {
            key,
            fields,
            members: Vec::new(),
        }
    }

    /// Sets the related members.
    #[must_use]
    pub fn with_members(mut self, members: Vec<String>) -> Self {
        self.members = members;
        self
    }

    /// Returns a field value, or the empty string when absent.
    #[must_use]
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }
}
