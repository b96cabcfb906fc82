// src/commands.rs
//! Command handlers for the rosforge CLI

use crate::cli::{Cli, FormatArg};
use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use rosforge::archive::ArchiveCache;
use rosforge::distro::Snapshot;
use rosforge::fetch::HttpFetcher;
use rosforge::generator::{GenerateConfig, Generator, TargetFormat};
use rosforge::resolver::CrossrefTable;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for the `generate` command
pub struct GenerateArgs {
    pub distro: String,
    pub format: FormatArg,
    pub output: PathBuf,
    pub tar_dir: PathBuf,
    pub overwrite: bool,
    pub index_url: Option<String>,
    pub report: Option<PathBuf>,
}

/// Run a full batch generation for one distribution
pub fn generate(args: GenerateArgs) -> Result<()> {
    let format = match args.format {
        FormatArg::Ebuild => TargetFormat::Ebuild,
        FormatArg::Nix => TargetFormat::Nix,
    };

    let fetcher = HttpFetcher::new()?;
    let snapshot = Snapshot::fetch(&args.distro, &fetcher, args.index_url.as_deref())?;
    let crossref = CrossrefTable::builtin(format.ecosystem())?;
    let mut cache = ArchiveCache::new(&args.tar_dir)?;

    let output_dir = args.output.join(format!("ros-{}", args.distro));
    let mut config = GenerateConfig::new(output_dir, format);
    config.preserve_existing = !args.overwrite;

    let generator = Generator::new(&snapshot, &fetcher, &crossref, config);
    let summary = generator.run(&mut cache)?;

    println!("{}", summary.render(&args.distro));

    if let Some(report_path) = &args.report {
        write_report(report_path, &summary)?;
    }

    Ok(())
}

fn write_report(path: &Path, summary: &rosforge::generator::RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write run report to {}", path.display()))?;
    info!("Wrote run report to {}", path.display());
    Ok(())
}

/// Print shell completions to stdout
pub fn completions(shell: Shell) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "rosforge", &mut std::io::stdout());
}
