use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_table<R>(headers: &[&str], rows: R)
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    let mut count = 0;
    for row in rows {
        builder.push_record(row);
        count += 1;
    }
    if count == 0 {
        println!("No resources found.");
        return;
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

/// Outcome of one resource in a plan, apply or destroy run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub address: String,
    pub identity: String,
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

pub fn print_reports(reports: &[Report], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(reports)?,
        OutputFormat::Table => {
            print_table(
                &["Address", "Identity", "Action", "Result"],
                reports.iter().map(|r| {
                    let action = r.action.clone().unwrap_or_else(|| "-".into());
                    let result = match &r.error {
                        Some(err) => format!("{} {err}", "✗".red()),
                        None => "✓".green().to_string(),
                    };
                    vec![r.address.clone(), r.identity.clone(), action, result]
                }),
            );
        }
    }
    Ok(())
}
