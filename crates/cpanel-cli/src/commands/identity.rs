use anyhow::Result;
use cpanel_reconcile::{CronJobSpec, CronJobs, ResourceHandler};
use serde_json::json;

use crate::cli::{IdentityArgs, OutputFormat};
use crate::output::print_json;

/// Prints the content identity a cron job would be matched by.
pub fn identity(args: &IdentityArgs, format: OutputFormat) -> Result<()> {
    let job = CronJobSpec {
        minute: args.minute.clone(),
        hour: args.hour.clone(),
        day: args.day.clone(),
        weekday: args.weekday.clone(),
        month: args.month.clone(),
        command: args.command.clone(),
    };
    CronJobs.validate(&job)?;

    let identity = job.identity();
    match format {
        OutputFormat::Json => print_json(&json!({ "identity": identity, "job": job }))?,
        OutputFormat::Table => println!("{identity}"),
    }
    Ok(())
}
