use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sitestack::config::STACK_ENV_VAR;

#[derive(Parser, Debug)]
#[command(name = "sitestack", version, about = "Provision a static website behind CloudFront")]
pub struct Cli {
    #[arg(long, global = true, env = STACK_ENV_VAR, default_value = "dev", help = "Stack to operate on")]
    pub stack: String,
    #[arg(
        long,
        global = true,
        default_value = ".",
        help = "Directory holding the Sitestack.<stack>.toml files"
    )]
    pub dir: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what would be provisioned, in order.
    Preview,
    /// Write the plan as JSON.
    Manifest {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Provision the stack and print its outputs.
    Up {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
