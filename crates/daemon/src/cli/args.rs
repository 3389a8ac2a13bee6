pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "rendezvous")]
#[command(about = "Rendezvous point for quorum-gated anonymous disclosures")]
pub struct Args {
    /// Server to talk to (defaults to localhost on the configured API port)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the rendezvous config directory (defaults to ~/.rendezvous)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
