use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use revdiff_watch::ListingOrder;

#[derive(Parser)]
#[command(
    name = "revdiff",
    about = "Diff stored objects against their previous revision",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OrderArg {
    LatestFirst,
    Unverified,
    OldestFirst,
    ByTimestamp,
}

impl From<OrderArg> for ListingOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::LatestFirst => Self::LatestFirst,
            OrderArg::Unverified => Self::Unverified,
            OrderArg::OldestFirst => Self::OldestFirst,
            OrderArg::ByTimestamp => Self::ByTimestamp,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Handle a batch of storage-change notifications
    Handle(HandleArgs),
    /// Diff two local files
    Diff(DiffArgs),
    /// Show which revision precedes the current one
    Resolve(ResolveArgs),
    /// Record a new revision of an object in a directory store
    Put(PutArgs),
}

#[derive(Args)]
pub struct StoreArgs {
    /// Root of the directory store (overrides the config file)
    #[arg(long)]
    pub store: Option<PathBuf>,
}

#[derive(Args)]
pub struct HandleArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    /// Notification JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub events: String,
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
    /// Do not stage payloads through temporary files
    #[arg(long)]
    pub no_stage: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    pub previous: PathBuf,
    pub latest: PathBuf,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(long)]
    pub container: String,
    #[arg(long)]
    pub object: String,
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,
}

#[derive(Args)]
pub struct PutArgs {
    #[command(flatten)]
    pub store: StoreArgs,
    #[arg(long)]
    pub container: String,
    #[arg(long)]
    pub object: String,
    /// Revision marker; defaults to a UTC timestamp
    #[arg(long)]
    pub marker: Option<String>,
    pub file: PathBuf,
}
