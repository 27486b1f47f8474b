mod cli;
mod commands;
mod manifest;
mod observability;
mod output;
mod state;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use commands::Session;
use manifest::Manifest;
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);
    let format = cli.format.unwrap_or_default();

    match &cli.command {
        Commands::Plan => {
            let manifest = Manifest::load(&cli.config)?;
            let session = Session::connect(&cli.config)?;
            commands::converge::plan(&session, &manifest, &cli.state, format).await?;
        }
        Commands::Apply => {
            let manifest = Manifest::load(&cli.config)?;
            let session = Session::connect(&cli.config)?;
            commands::converge::apply(&session, &manifest, &cli.state, format).await?;
        }
        Commands::Destroy => {
            let session = Session::connect(&cli.config)?;
            commands::converge::destroy(&session, &cli.state, format).await?;
        }
        Commands::List(args) => {
            let session = Session::connect(&cli.config)?;
            commands::list::list(&session, args.kind, format).await?;
        }
        Commands::Identity(args) => {
            commands::identity::identity(args, format)?;
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => commands::config::show(&cli.config, format)?,
        },
    }

    Ok(())
}
