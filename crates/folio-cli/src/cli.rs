use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: manuscript version control with history-preserving rollback",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

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
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Diff two manuscript documents (JSON files)
    Diff(DiffArgs),
    /// Print a document in canonical form
    Canonical(DocumentArgs),
    /// Print the content hash of a document
    Hash(DocumentArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to bind, overriding the configuration file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub from: PathBuf,
    pub to: PathBuf,
    /// Only print the per-section summary
    #[arg(long)]
    pub sections: bool,
}

#[derive(Args)]
pub struct DocumentArgs {
    pub path: PathBuf,
}
