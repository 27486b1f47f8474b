//! # cpanel-reconcile
//!
//! Convergence of declared cPanel resources against the live host.
//!
//! A [`Reconciler`] reads the remote collection fresh on every call, matches
//! the desired spec to an observed record by [`Identity`], and issues the
//! minimal create, update or delete through a [`cpanel_api::Gateway`].
//!
//! - [`CronJobs`]: crontab lines matched by a content digest of their fields
//! - [`Databases`]: PostgreSQL databases, renames and user privileges
//! - [`Users`]: PostgreSQL users, renames and passwords
//!
//! ```ignore
//! use cpanel_reconcile::{Reconciler, Users, UserSpec};
//!
//! let users = Reconciler::new(gateway.clone(), Users);
//! let outcome = users
//!     .converge(Some(&UserSpec::new("alice", "pw")), None)
//!     .await?;
//! println!("{} {}", outcome.action, outcome.identity);
//! ```

pub mod cron_job;
pub mod database;
pub mod error;
pub mod identity;
pub mod membership;
pub mod reconciler;
pub mod user;

pub use cron_job::{CronJobSpec, CronJobs};
pub use database::{DatabaseSpec, Databases};
pub use error::{ErrorCategory, ReconcileError};
pub use identity::Identity;
pub use membership::{Grant, MembershipDiff, MembershipSet};
pub use reconciler::{Action, Applied, Outcome, Plan, Reconciler, ResourceHandler};
pub use user::{UserSpec, Users};

pub type CronJobReconciler = Reconciler<CronJobs>;
pub type DatabaseReconciler = Reconciler<Databases>;
pub type UserReconciler = Reconciler<Users>;
