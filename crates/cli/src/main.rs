mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rolemine")]
#[command(about = "Build class-role feature datasets from JProfiler exports", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract call-tree features, optionally joined with object features and labels
    Extract(commands::ExtractArgs),
    /// Compute recorded-object features only
    Objects(commands::ObjectsArgs),
    /// List the distinct classes of one or more call trees
    Classes(commands::ClassesArgs),
    /// Export the class call graph of one or more traces as JSON
    Graph(commands::GraphArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => commands::extract(&args),
        Commands::Objects(args) => commands::objects(&args),
        Commands::Classes(args) => commands::classes(&args),
        Commands::Graph(args) => commands::graph(&args),
    }
}
