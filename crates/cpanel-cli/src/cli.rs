use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "cpanel")]
#[command(about = "Converge cron jobs and PostgreSQL databases/users on a cPanel host")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Manifest file with desired resources and optional [gateway] settings
    #[arg(short, long, global = true, env = "CPANEL_CONFIG", default_value = "cpanel.toml")]
    pub config: PathBuf,

    /// File holding the last applied state
    #[arg(short, long, global = true, env = "CPANEL_STATE", default_value = ".cpanel-state.json")]
    pub state: PathBuf,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what apply would change, without changing anything
    Plan,
    /// Converge the host to the manifest
    Apply,
    /// Remove every resource recorded in the state file
    Destroy,
    /// List resources currently on the host
    List(ListArgs),
    /// Print the content identity of a cron job
    Identity(IdentityArgs),
    /// Inspect gateway configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub kind: ListKind,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ListKind {
    CronJobs,
    Databases,
    Users,
}

#[derive(clap::Args)]
pub struct IdentityArgs {
    #[arg(long, default_value = "*")]
    pub minute: String,
    #[arg(long, default_value = "*")]
    pub hour: String,
    #[arg(long, default_value = "*")]
    pub day: String,
    /// 0-7 or *
    #[arg(long, default_value = "*")]
    pub weekday: String,
    #[arg(long, default_value = "*")]
    pub month: String,
    /// Command line of the job
    #[arg(long)]
    pub command: String,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective gateway configuration (token masked)
    Show,
}
