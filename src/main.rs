// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            distro,
            format,
            output,
            tar_dir,
            overwrite,
            index_url,
            report,
        } => commands::generate(commands::GenerateArgs {
            distro,
            format,
            output,
            tar_dir,
            overwrite,
            index_url,
            report,
        }),
        Commands::Completions { shell } => {
            commands::completions(shell);
            Ok(())
        }
    }
}
