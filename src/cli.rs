use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "regeldoc")]
#[command(about = "Documentation for rule services, rule flows and rule sets")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default regeldoc.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Generate documentation
    Generate {
        /// Repository root to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory for documentation
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (markdown, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Report declarations that cannot be documented
    Validate {
        /// Repository root to analyze
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Fail when any declaration could not be documented
        #[arg(long)]
        strict: bool,
    },
}

impl Cli {
    pub async fn execute(self, mut engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path, force } => {
                engine.init(path, force).await
            }
            Commands::Generate { source, output, format } => {
                engine.generate(source, output, format).await
            }
            Commands::Validate { source, strict } => {
                engine.validate(source, strict).await
            }
        }
    }
}
