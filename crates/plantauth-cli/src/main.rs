mod cli;
mod commands;
mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use plantauth::api::StaticBearerToken;
use plantauth::claims::NoLocalPersons;
use plantauth::{AuthzConfig, PlantAuth, load_config};
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
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
    let config = load_config(cli.config.as_deref()).context("loading configuration")?;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    plantauth::observability::init_tracing(level)?;

    let format = cli.format.unwrap_or_default();
    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    match &cli.command {
        Commands::Config => output::print_json(&config)?,
        Commands::Claims(args) => {
            let auth = connect(&config, &cli).await?;
            commands::claims::claims(&auth, args, format, &cancel).await?;
        }
        Commands::Person(args) => {
            let auth = connect(&config, &cli).await?;
            commands::cache::person(&auth, args.user, format, &cancel).await?;
        }
        Commands::Persons(args) => {
            let auth = connect(&config, &cli).await?;
            commands::cache::persons(&auth, &args.plant, format, &cancel).await?;
        }
        Commands::Plants(args) => {
            let auth = connect(&config, &cli).await?;
            commands::cache::plants(&auth, args.user, format, &cancel).await?;
        }
        Commands::Access(args) => {
            let auth = connect(&config, &cli).await?;
            commands::cache::access(&auth, args.user, &args.plant, format, &cancel).await?;
        }
        Commands::Invalidate(args) => {
            let auth = connect(&config, &cli).await?;
            commands::cache::invalidate(&auth, args, &cancel).await?;
        }
    }

    Ok(())
}

async fn connect(config: &AuthzConfig, cli: &Cli) -> Result<PlantAuth> {
    let token = cli
        .token
        .as_deref()
        .context("--token (or PLANTAUTH_TOKEN) is required")?;
    let auth = PlantAuth::from_config(
        config,
        Arc::new(StaticBearerToken::new(token)),
        Arc::new(NoLocalPersons),
    )
    .await?;
    Ok(auth)
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            cancel.cancel();
        }
    });
}
