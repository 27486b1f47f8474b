//! # cpanel-api
//!
//! Remote gateway for the cPanel host managed by cpanel-converge.
//!
//! ## Overview
//!
//! The main trait is [`Gateway`], the only contract the reconciliation core
//! depends on:
//! - full-snapshot reads (`list_all`)
//! - single-resource writes (`create_one`, `update_one`, `rename_one`, `delete_one`)
//! - privilege membership (`grant`, `revoke`)
//!
//! [`CpanelClient`] implements it over HTTP. Scheduled jobs go through the
//! API2 `Cron` module, PostgreSQL databases and users through the UAPI
//! `Postgresql` module; both response dialects are reduced to the same
//! success/failure shape (see [`envelope`]).
//!
//! ## Example
//!
//! ```ignore
//! use cpanel_api::{CpanelClient, Gateway, ResourceKind, config::loader::load_config};
//!
//! let config = load_config(None)?;
//! let client = CpanelClient::new(&config)?;
//! for record in client.list_all(ResourceKind::Database).await? {
//!     println!("{} {:?}", record.field("name"), record.members);
//! }
//! ```

mod client;
pub mod config;
pub mod cron;
pub mod envelope;
mod error;
pub mod postgresql;
mod traits;
mod types;

pub use client::CpanelClient;
pub use config::GatewayConfig;
pub use error::{ConfigError, GatewayError};
pub use traits::Gateway;
pub use types::{Fields, ObservedRecord, RemoteKey, ResourceKind, required_field};

/// Type alias for a shared gateway handle.
pub type DynGateway = std::sync::Arc<dyn Gateway>;
