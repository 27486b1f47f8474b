use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use cpanel_api::config::loader::load_config;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::output::print_json;

pub fn show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let cfg = load_config(Some(config_path)).context("Failed to load gateway configuration")?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "host": cfg.host,
            "username": cfg.username,
            "api_token": cfg.masked_token(),
            "timeout_secs": cfg.timeout_secs,
        }))?,
        OutputFormat::Table => {
            println!("{}: {}", "Host".cyan(), cfg.host);
            println!("{}: {}", "Username".cyan(), cfg.username);
            println!("{}: {}", "API token".cyan(), cfg.masked_token());
            println!("{}: {}s", "Timeout".cyan(), cfg.timeout_secs);
        }
    }
    Ok(())
}
