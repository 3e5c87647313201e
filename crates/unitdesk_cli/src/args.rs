use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "unitdesk")]
#[command(about = "Manage capsule and cabin units", long_about = None)]
pub struct Cli {
    /// TOML config file; defaults plus UNITDESK_* env when omitted
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print core health check and version
    Ping,

    /// Unit inventory operations
    #[command(subcommand)]
    Units(UnitsCommand),

    /// Serve the HTTP API under /api/units
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Subcommand, Debug)]
pub enum UnitsCommand {
    /// List units, optionally filtered
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Show one unit
    Get { id: String },

    /// Create a unit
    Create {
        #[arg(long)]
        name: String,

        /// capsule | cabin
        #[arg(long = "type")]
        kind: String,

        /// Requested status; kept only under the honor_requested policy
        #[arg(long, default_value = "Available")]
        status: String,
    },

    /// Change fields of a unit
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Remove every unit
    Clear,
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long = "type")]
    pub kind: Option<String>,
}
