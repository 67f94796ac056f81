use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "plantauth")]
#[command(about = "PlantAuth CLI: resolve plant-scoped claims and inspect the caches behind them")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to plantauth.toml when present)
    #[arg(short, long, global = true, env = "PLANTAUTH_CONFIG")]
    pub config: Option<String>,

    /// Log filter, overrides logging.level from the configuration
    #[arg(long, global = true, env = "PLANTAUTH_LOG")]
    pub log_level: Option<String>,

    /// Application bearer token for the main API
    #[arg(long, global = true, env = "PLANTAUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the claims a user would get for a request
    Claims(ClaimsArgs),
    /// Look up a person by object id
    Person(UserArgs),
    /// List all persons in a plant
    Persons(PlantArgs),
    /// List the plants a user knows of, with access
    Plants(UserArgs),
    /// Show the cached permission data for a user in a plant
    Access(UserPlantArgs),
    /// Drop cached entries for a user in a plant
    Invalidate(InvalidateArgs),
    /// Print the effective configuration
    Config,
}

#[derive(clap::Args)]
pub struct UserArgs {
    /// User object id
    #[arg(short, long)]
    pub user: Uuid,
}

#[derive(clap::Args)]
pub struct PlantArgs {
    /// Plant id (e.g. PCS$TROLL_A)
    #[arg(short, long)]
    pub plant: String,
}

#[derive(clap::Args)]
pub struct UserPlantArgs {
    /// User object id
    #[arg(short, long)]
    pub user: Uuid,
    /// Plant id
    #[arg(short, long)]
    pub plant: String,
}

#[derive(clap::Args)]
pub struct ClaimsArgs {
    /// User object id
    #[arg(short, long)]
    pub user: Uuid,
    /// Plant the request is scoped to; omit for a request without a plant
    #[arg(short, long)]
    pub plant: Option<String>,
}

#[derive(clap::Args)]
pub struct InvalidateArgs {
    /// User object id
    #[arg(short, long)]
    pub user: Uuid,
    /// Plant id
    #[arg(short, long)]
    pub plant: String,
    /// Also drop the cached person
    #[arg(long)]
    pub person: bool,
}
