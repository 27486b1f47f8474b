//! `plan`, `apply` and `destroy`.
//!
//! Kinds are processed users, databases, cron jobs, since databases grant
//! privileges to users; removals run in the reverse order. Cron jobs are
//! converged one at a time because their line keys renumber on every write.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use cpanel_api::ResourceKind;
use cpanel_reconcile::{Applied, Outcome, ReconcileError, Reconciler, ResourceHandler};
use futures_util::future::join_all;

use super::Session;
use crate::cli::OutputFormat;
use crate::manifest::Manifest;
use crate::output::{Report, print_reports, print_success};
use crate::state::State;

/// One instance to converge.
#[derive(Debug)]
pub struct Entry<S> {
    pub label: String,
    pub desired: Option<S>,
    pub prior: Option<S>,
}

/// Entries for every manifest label, paired with their prior state.
pub fn upserts<S: Clone>(
    desired: &BTreeMap<String, S>,
    prior: &BTreeMap<String, Applied<S>>,
) -> Vec<Entry<S>> {
    desired
        .iter()
        .map(|(label, spec)| Entry {
            label: label.clone(),
            desired: Some(spec.clone()),
            prior: prior.get(label).map(|a| a.spec.clone()),
        })
        .collect()
}

/// Entries for labels that are only in the prior state.
pub fn removals<S: Clone>(
    desired: &BTreeMap<String, S>,
    prior: &BTreeMap<String, Applied<S>>,
) -> Vec<Entry<S>> {
    prior
        .iter()
        .filter(|(label, _)| !desired.contains_key(*label))
        .map(|(label, applied)| Entry {
            label: label.clone(),
            desired: None,
            prior: Some(applied.spec.clone()),
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Mode {
    Sequential,
    Concurrent,
}

async fn converge_all<H: ResourceHandler>(
    reconciler: &Reconciler<H>,
    entries: Vec<Entry<H::Spec>>,
    mode: Mode,
    state: &mut BTreeMap<String, Applied<H::Spec>>,
) -> Vec<Report> {
    let converge_one = |entry: Entry<H::Spec>| async move {
        let result = reconciler
            .converge(entry.desired.as_ref(), entry.prior.as_ref())
            .await;
        (entry, result)
    };

    let results = match mode {
        Mode::Concurrent => join_all(entries.into_iter().map(converge_one)).await,
        Mode::Sequential => {
            let mut results = Vec::with_capacity(entries.len());
            for entry in entries {
                results.push(converge_one(entry).await);
            }
            results
        }
    };

    results
        .into_iter()
        .map(|(entry, result)| record(reconciler.kind(), entry, result, state))
        .collect()
}

/// Folds one outcome into the state and reports it.
fn record<S>(
    kind: ResourceKind,
    entry: Entry<S>,
    result: Result<Outcome<S>, ReconcileError>,
    state: &mut BTreeMap<String, Applied<S>>,
) -> Report {
    let address = format!("{kind}.{}", entry.label);
    match result {
        Ok(outcome) => {
            if outcome.action.is_change() {
                tracing::info!(address = %address, action = %outcome.action, "Converged");
            }
            match outcome.applied {
                Some(applied) => {
                    state.insert(entry.label, applied);
                }
                None => {
                    state.remove(&entry.label);
                }
            }
            Report {
                address,
                identity: outcome.identity.to_string(),
                action: Some(outcome.action.to_string()),
                error: None,
            }
        }
        Err(err) => {
            tracing::error!(address = %address, category = %err.category(), error = %err, "Convergence failed");
            Report {
                address,
                identity: err.identity().to_string(),
                action: None,
                error: Some(err.message().to_string()),
            }
        }
    }
}

async fn plan_all<H: ResourceHandler>(
    reconciler: &Reconciler<H>,
    entries: Vec<Entry<H::Spec>>,
) -> Vec<Report> {
    let mut reports = Vec::with_capacity(entries.len());
    for entry in entries {
        let address = format!("{}.{}", reconciler.kind(), entry.label);
        let report = match reconciler
            .plan(entry.desired.as_ref(), entry.prior.as_ref())
            .await
        {
            Ok(plan) => Report {
                address,
                identity: plan.identity.to_string(),
                action: Some(plan.action.to_string()),
                error: None,
            },
            Err(err) => Report {
                address,
                identity: err.identity().to_string(),
                action: None,
                error: Some(err.message().to_string()),
            },
        };
        reports.push(report);
    }
    reports
}

pub async fn plan(
    session: &Session,
    manifest: &Manifest,
    state_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let state = State::load(state_path)?;
    let mut reports = Vec::new();

    reports.extend(plan_all(&session.users, upserts(&manifest.user, &state.user)).await);
    reports.extend(
        plan_all(
            &session.databases,
            upserts(&manifest.database, &state.database),
        )
        .await,
    );
    reports.extend(
        plan_all(
            &session.cron_jobs,
            upserts(&manifest.cron_job, &state.cron_job),
        )
        .await,
    );
    reports.extend(
        plan_all(
            &session.cron_jobs,
            removals(&manifest.cron_job, &state.cron_job),
        )
        .await,
    );
    reports.extend(
        plan_all(
            &session.databases,
            removals(&manifest.database, &state.database),
        )
        .await,
    );
    reports.extend(plan_all(&session.users, removals(&manifest.user, &state.user)).await);

    print_reports(&reports, format)?;
    finish(&reports, format, "to change")
}

pub async fn apply(
    session: &Session,
    manifest: &Manifest,
    state_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let mut state = State::load(state_path)?;
    let mut reports = Vec::new();

    let entries = upserts(&manifest.user, &state.user);
    reports.extend(converge_all(&session.users, entries, Mode::Concurrent, &mut state.user).await);
    state.save(state_path)?;

    let entries = upserts(&manifest.database, &state.database);
    reports.extend(
        converge_all(
            &session.databases,
            entries,
            Mode::Concurrent,
            &mut state.database,
        )
        .await,
    );
    state.save(state_path)?;

    let entries = upserts(&manifest.cron_job, &state.cron_job);
    reports.extend(
        converge_all(
            &session.cron_jobs,
            entries,
            Mode::Sequential,
            &mut state.cron_job,
        )
        .await,
    );
    state.save(state_path)?;

    let entries = removals(&manifest.cron_job, &state.cron_job);
    reports.extend(
        converge_all(
            &session.cron_jobs,
            entries,
            Mode::Sequential,
            &mut state.cron_job,
        )
        .await,
    );
    state.save(state_path)?;

    let entries = removals(&manifest.database, &state.database);
    reports.extend(
        converge_all(
            &session.databases,
            entries,
            Mode::Concurrent,
            &mut state.database,
        )
        .await,
    );
    state.save(state_path)?;

    let entries = removals(&manifest.user, &state.user);
    reports.extend(converge_all(&session.users, entries, Mode::Concurrent, &mut state.user).await);
    state.save(state_path)?;

    print_reports(&reports, format)?;
    finish(&reports, format, "changed")
}

pub async fn destroy(session: &Session, state_path: &Path, format: OutputFormat) -> Result<()> {
    let mut state = State::load(state_path)?;
    let mut reports = Vec::new();

    let entries = removals(&BTreeMap::new(), &state.cron_job);
    reports.extend(
        converge_all(
            &session.cron_jobs,
            entries,
            Mode::Sequential,
            &mut state.cron_job,
        )
        .await,
    );
    state.save(state_path)?;

    let entries = removals(&BTreeMap::new(), &state.database);
    reports.extend(
        converge_all(
            &session.databases,
            entries,
            Mode::Concurrent,
            &mut state.database,
        )
        .await,
    );
    state.save(state_path)?;

    let entries = removals(&BTreeMap::new(), &state.user);
    reports.extend(converge_all(&session.users, entries, Mode::Concurrent, &mut state.user).await);
    state.save(state_path)?;

    print_reports(&reports, format)?;
    finish(&reports, format, "removed")
}

fn finish(reports: &[Report], format: OutputFormat, verb: &str) -> Result<()> {
    let failed = reports.iter().filter(|r| r.failed()).count();
    if failed > 0 {
        bail!("{failed} of {} resource(s) failed", reports.len());
    }
    if matches!(format, OutputFormat::Table) {
        let changed = reports
            .iter()
            .filter(|r| r.action.as_deref().is_some_and(|a| a != "no-op"))
            .count();
        print_success(&format!(
            "{changed} {verb}, {} unchanged",
            reports.len() - changed
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpanel_reconcile::{Action, Identity, UserSpec};

    fn prior(names: &[&str]) -> BTreeMap<String, Applied<UserSpec>> {
        names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    Applied {
                        spec: UserSpec::new(*n, "pw"),
                        key: None,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn labels_split_into_upserts_and_removals() {
        let desired: BTreeMap<String, UserSpec> = [("app", "pw2"), ("new", "pw")]
            .iter()
            .map(|(n, p)| (n.to_string(), UserSpec::new(*n, *p)))
            .collect();
        let prior = prior(&["app", "old"]);

        let up = upserts(&desired, &prior);
        assert_eq!(up.len(), 2);
        assert_eq!(up[0].label, "app");
        assert_eq!(up[0].prior.as_ref().unwrap().password, "pw");
        assert!(up[1].prior.is_none());

        let gone = removals(&desired, &prior);
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].label, "old");
        assert!(gone[0].desired.is_none());
    }

    #[test]
    fn outcomes_update_state() {
        let mut state = prior(&["app", "old"]);

        let deleted = Outcome {
            action: Action::Delete,
            identity: Identity::natural("old"),
            applied: None,
        };
        let entry = Entry {
            label: "old".to_string(),
            desired: None,
            prior: Some(UserSpec::new("old", "pw")),
        };
        let report = record(ResourceKind::User, entry, Ok(deleted), &mut state);
        assert_eq!(report.address, "postgresql_user.old");
        assert_eq!(report.action.as_deref(), Some("delete"));
        assert!(!state.contains_key("old"));

        let entry = Entry {
            label: "app".to_string(),
            desired: Some(UserSpec::new("app", "new")),
            prior: Some(UserSpec::new("app", "pw")),
        };
        let err = ReconcileError::validation(ResourceKind::User, &Identity::natural("app"), "nope");
        let report = record(ResourceKind::User, entry, Err(err), &mut state);
        assert!(report.failed());
        assert_eq!(state["app"].spec.password, "pw");
    }
}
