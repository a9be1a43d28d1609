// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kahu")]
#[command(about = "Real-time deploy and rule status for your services")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which resource to operate on.
#[derive(Args)]
pub struct TargetArgs {
    /// Resource identifier
    pub id: String,

    /// Environment the deploys and rules belong to
    #[arg(short, long, default_value = "production")]
    pub environment: String,

    /// Resource collection (overrides the config file)
    #[arg(short, long)]
    pub resource: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new kahu.yml configuration file
    Init {
        /// Status server base URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Overwrite an existing kahu.yml
        #[arg(short, long)]
        force: bool,
    },

    /// Follow a resource's status until interrupted
    Watch {
        #[command(flatten)]
        target: TargetArgs,

        /// Print JSON lines instead of text
        #[arg(long, conflicts_with = "quiet")]
        json: bool,

        /// Only print phase changes
        #[arg(short, long)]
        quiet: bool,
    },

    /// Deploy a resource and wait for the server to pick it up
    Deploy {
        #[command(flatten)]
        target: TargetArgs,
    },
}
