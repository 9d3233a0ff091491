// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Health check command

use clap::Args;
use hgsync_core::{Mercurial, SyncConfig};

#[derive(Args, Clone, Debug)]
#[command(about = "Check that Mercurial can be run")]
pub struct HealthArgs {
    #[arg(long, help = "Output in JSON format")]
    pub json: bool,
}

impl HealthArgs {
    /// Fails when the configured `hg` cannot be run
    pub async fn run(self, config: &SyncConfig) -> anyhow::Result<()> {
        let hg = config.hg_cli();
        let version = hg.version().await;

        if self.json {
            let report = match &version {
                Ok(v) => serde_json::json!({
                    "hg_binary": hg.binary().to_string_lossy(),
                    "status": "available",
                    "version": v,
                }),
                Err(e) => serde_json::json!({
                    "hg_binary": hg.binary().to_string_lossy(),
                    "status": "unavailable",
                    "error": e.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            match &version {
                Ok(v) => println!("✅ hg {} ({})", v, hg.binary().display()),
                Err(e) => println!("❌ hg not usable ({}): {}", hg.binary().display(), e),
            }
        }

        version.map(|_| ()).map_err(Into::into)
    }
}
