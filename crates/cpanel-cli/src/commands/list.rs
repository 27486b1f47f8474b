use anyhow::Result;
use cpanel_api::{ObservedRecord, RemoteKey};
use cpanel_reconcile::{CronJobSpec, ResourceHandler};
use serde_json::{Value, json};

use super::Session;
use crate::cli::{ListKind, OutputFormat};
use crate::output::{print_json, print_table};

pub async fn list(session: &Session, kind: ListKind, format: OutputFormat) -> Result<()> {
    match kind {
        ListKind::CronJobs => {
            let records = session.cron_jobs.list().await?;
            let handler = session.cron_jobs.handler();
            match format {
                OutputFormat::Json => {
                    let rows: Vec<Value> = records
                        .iter()
                        .map(|r| {
                            json!({
                                "linekey": r.key,
                                "identity": handler.record_identity(r),
                                "job": CronJobSpec::from_record(r),
                            })
                        })
                        .collect();
                    print_json(&rows)?;
                }
                OutputFormat::Table => print_table(
                    &["Line", "Identity", "Schedule", "Command"],
                    records.iter().map(|r| {
                        let job = CronJobSpec::from_record(r);
                        vec![
                            key_text(r),
                            handler.record_identity(r).to_string(),
                            format!(
                                "{} {} {} {} {}",
                                job.minute, job.hour, job.day, job.month, job.weekday
                            ),
                            job.command,
                        ]
                    }),
                ),
            }
        }
        ListKind::Databases => {
            let records = session.databases.list().await?;
            match format {
                OutputFormat::Json => {
                    let rows: Vec<Value> = records
                        .iter()
                        .map(|r| {
                            json!({
                                "name": r.field("name"),
                                "disk_usage": r.fields.get("disk_usage"),
                                "users": r.members,
                            })
                        })
                        .collect();
                    print_json(&rows)?;
                }
                OutputFormat::Table => print_table(
                    &["Name", "Users", "Disk usage"],
                    records.iter().map(|r| {
                        vec![
                            r.field("name").to_string(),
                            r.members.join(", "),
                            r.fields.get("disk_usage").cloned().unwrap_or_default(),
                        ]
                    }),
                ),
            }
        }
        ListKind::Users => {
            let records = session.users.list().await?;
            match format {
                OutputFormat::Json => {
                    let names: Vec<&str> = records.iter().map(|r| r.field("name")).collect();
                    print_json(&names)?;
                }
                OutputFormat::Table => print_table(
                    &["Name"],
                    records.iter().map(|r| vec![r.field("name").to_string()]),
                ),
            }
        }
    }
    Ok(())
}

fn key_text(record: &ObservedRecord) -> String {
    match &record.key {
        Some(RemoteKey::Line(line)) => line.to_string(),
        Some(key) => key.to_string(),
        None => "-".to_string(),
    }
}
