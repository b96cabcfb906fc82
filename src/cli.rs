// src/cli.rs

//! CLI definitions for rosforge
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rosforge")]
#[command(version)]
#[command(about = "Generates Gentoo ebuilds and Nix derivations from a ROS distribution index", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate recipes for every package in a distribution
    Generate {
        /// ROS distribution name (e.g. humble, jazzy)
        distro: String,

        /// Target recipe format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Ebuild)]
        format: FormatArg,

        /// Output directory root (recipes land in <output>/ros-<distro>/)
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Directory for cached source archives
        #[arg(long, default_value = "tar_archives")]
        tar_dir: PathBuf,

        /// Regenerate recipes even when an up-to-date file exists
        #[arg(long)]
        overwrite: bool,

        /// Override the distribution index URL template
        /// ({distro} expands to the distribution name)
        #[arg(long)]
        index_url: Option<String>,

        /// Write a machine-readable JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Recipe format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Ebuild,
    Nix,
}
