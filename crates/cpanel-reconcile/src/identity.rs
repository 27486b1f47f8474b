//! Content identity for resources whose remote key is unstable.
//!
//! Crontab line keys are positional and renumber whenever another line is
//! added or removed, so a job is recognised across reads by a digest of its
//! own fields instead. The digest is the lowercase hex MD5 of the fields
//! joined with `-`. Existing state depends on this exact format.
//!
//! Collisions are possible in theory and not detected.

use std::fmt;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Separator placed between field values before hashing.
pub const SEPARATOR: &str = "-";

/// Length of a content identity in hex characters.
pub const CONTENT_IDENTITY_LEN: usize = 32;

/// Stable key used to match a desired spec to an observed record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Derives a content identity from ordered field values.
    ///
    /// Same values in the same order always give the same identity, on any
    /// host and across restarts.
    pub fn resolve<S: AsRef<str>>(fields: &[S]) -> Self {
        let joined = fields
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(SEPARATOR);
        Self(hex::encode(Md5::digest(joined.as_bytes())))
    }

    /// Uses a natural key (database or user name) verbatim.
    pub fn natural(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
