use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "statediff",
    about = "Compare two versioned Merkle key-value stores module by module",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Left store directory (must end in .db); overrides STATEDIFF_LEFT
    #[arg(long, global = true)]
    pub left: Option<String>,

    /// Right store directory (must end in .db); overrides STATEDIFF_RIGHT
    #[arg(long, global = true)]
    pub right: Option<String>,

    /// TOML config file with `left`, `right` and a `[server]` table
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List modules present in both stores
    Modules(ModulesArgs),
    /// Show key counts and first-byte histograms of both stores
    Stats(StatsArgs),
    /// Show the committed versions of a module on each side
    Versions(VersionsArgs),
    /// Diff modules at their highest common version
    Diff(DiffArgs),
    /// Serve the comparison API over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct ModulesArgs {}

#[derive(Args)]
pub struct StatsArgs {}

#[derive(Args)]
pub struct VersionsArgs {
    pub module: String,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Modules to diff; all common modules when omitted
    pub modules: Vec<String>,
    /// Print only the status line of each module
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address; overrides `[server] bind_addr`
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
