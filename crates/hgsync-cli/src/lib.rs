// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Context;
use clap::Subcommand;
use hgsync_core::config::{self, ConfigOverrides, ConfigPaths, SyncConfig};
use hgsync_logging::CliLoggingArgs;
use std::path::PathBuf;

pub mod health;
pub mod mirror_commands;

#[derive(clap::Parser)]
#[command(
    name = "hgsync",
    about = "Keep local mirrors of remote Mercurial repositories",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Extra configuration file, applied over the user configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    /// Mercurial executable to run
    #[arg(long, global = true)]
    pub hg_binary: Option<PathBuf>,
    /// Directory relative base paths are resolved against
    #[arg(long, global = true)]
    pub mirror_root: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone the remote into its mirror unless already cloned; prints the mirror path
    Clone(mirror_commands::MirrorArgs),
    /// Pull all remote heads into an existing mirror
    Update(mirror_commands::MirrorArgs),
    /// Push mirror changesets to the remote (never forced)
    Push(mirror_commands::MirrorArgs),
    /// Show where the mirror for a remote lives
    Path(mirror_commands::PathArgs),
    Health(health::HealthArgs),
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            hg_binary: self.hg_binary.clone(),
            mirror_root: self.mirror_root.clone(),
            log_level: self.logging.log_level,
        }
    }

    pub fn load_config(&self) -> anyhow::Result<SyncConfig> {
        let paths = ConfigPaths::discover(self.config.clone());
        config::load(&paths, &self.config_overrides()).context("loading configuration")
    }

    pub async fn run(self, config: &SyncConfig) -> anyhow::Result<()> {
        match self.command {
            Commands::Clone(args) => args.clone_mirror(config).await,
            Commands::Update(args) => args.update(config).await,
            Commands::Push(args) => args.push(config).await,
            Commands::Path(args) => args.run(config),
            Commands::Health(args) => args.run(config).await,
        }
    }
}

pub use clap::Parser;
