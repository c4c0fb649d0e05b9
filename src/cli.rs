use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ktc")]
#[command(version)]
#[command(about = "Declaratively configure Kafka topics", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the cluster toward the topic definitions
    Apply(ApplyArgs),

    /// Show the topics currently configured on the cluster
    Describe(DescribeArgs),

    /// Load and merge definition files without contacting the cluster
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared arguments
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct ClusterArgs {
    /// Kafka bootstrap servers, in the form host1:port1,host2:port2,...
    #[arg(short, long, env = "KTC_BOOTSTRAP")]
    pub bootstrap: String,

    /// Extra .properties files configuring the client (comma-separated)
    #[arg(
        short = 'p',
        long,
        env = "KTC_EXTRA_PROPERTIES",
        value_delimiter = ','
    )]
    pub extra_properties: Vec<PathBuf>,

    /// Deadline for each cluster call, in seconds
    #[arg(long, env = "KTC_TIMEOUT", default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

#[derive(Args, Debug, Clone)]
pub struct DefinitionArgs {
    /// Topic definition files (comma-separated, later files win)
    #[arg(
        short,
        long,
        env = "KTC_DEFINITIONS",
        value_delimiter = ',',
        required = true
    )]
    pub definitions: Vec<PathBuf>,

    /// Force a replication factor of 1 on every topic (local testing)
    #[arg(long, env = "KTC_NO_REPLICATION")]
    pub no_replication: bool,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    #[command(flatten)]
    pub definitions: DefinitionArgs,

    /// Only validate creations and updates, skip partition growth
    #[arg(short = 'n', long, env = "KTC_DRY_RUN")]
    pub dry_run: bool,

    /// Delete topics missing from the definition files
    #[arg(long, env = "KTC_REMOVE_TOPICS")]
    pub remove_topics: bool,
}

#[derive(Args, Debug)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub definitions: DefinitionArgs,
}
