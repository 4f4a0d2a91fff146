//! Keepstate - values that survive restarts.
//!
//! This is the entry point for the keepstate CLI. The `greet` command is a
//! small consumer of the persistent state adapter: it remembers a name in
//! the store and greets whoever it remembers.

mod commands;
mod greeting;

use clap::{Parser, Subcommand};
use commands::Context;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keepstate")]
#[command(author, version, about = "Keep a value in sync with a durable key-value store", long_about = None)]
struct Cli {
    /// Store file to use instead of the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Greet the remembered name, optionally remembering a new one
    Greet {
        /// Key the name is stored under
        #[arg(long, default_value = "name")]
        key: String,
        /// Name to use when nothing is stored yet
        #[arg(long, default_value = "")]
        initial_name: String,
        /// New name to remember
        #[arg(long)]
        name: Option<String>,
    },
    /// Move the remembered name to a different key
    Rename {
        /// Current key
        #[arg(long)]
        from: String,
        /// New key
        #[arg(long)]
        to: String,
        /// Name to use when nothing is stored under the current key
        #[arg(long, default_value = "")]
        initial_name: String,
    },
    /// Print the raw stored text for a key
    Get {
        key: String,
    },
    /// Delete the entry for a key
    Remove {
        key: String,
    },
    /// List stored keys
    Keys,
    /// Show configuration
    Config,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    // Version must work even with a broken config
    if let Commands::Version = cli.command {
        commands::print_version();
        return Ok(());
    }

    let ctx = Context::load(&cwd, cli.store, cli.verbose).await?;
    run(&ctx, cli.command)
}

fn run(ctx: &Context, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Greet {
            key,
            initial_name,
            name,
        } => commands::greet(ctx, &key, initial_name, name),
        Commands::Rename {
            from,
            to,
            initial_name,
        } => commands::rename(ctx, &from, &to, initial_name),
        Commands::Get { key } => commands::get(ctx, &key),
        Commands::Remove { key } => commands::remove(ctx, &key),
        Commands::Keys => commands::keys(ctx),
        Commands::Config => commands::show_config(ctx),
        Commands::Version => {
            commands::print_version();
            Ok(())
        }
    }
}
