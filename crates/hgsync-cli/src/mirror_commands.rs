// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! clone, update, push and path commands

use clap::Args;
use hgsync_core::{HgCli, HgRemote, NonLocalMirror, PushOutcome, SyncConfig};

#[derive(Args, Clone, Debug)]
pub struct MirrorArgs {
    /// Remote repository URL or path, as accepted by Mercurial
    pub remote: String,
    /// Base directory the mirror is kept under
    pub base: String,
}

impl MirrorArgs {
    fn mirror(&self, config: &SyncConfig) -> anyhow::Result<NonLocalMirror<HgRemote, HgCli>> {
        let remote =
            HgRemote::new(&self.remote, config.mirror_root())?.with_ui(config.ui_config());
        Ok(NonLocalMirror::new(remote, config.hg_cli()))
    }

    pub async fn clone_mirror(&self, config: &SyncConfig) -> anyhow::Result<()> {
        let path = self.mirror(config)?.clone(&self.base).await?;
        println!("{}", path.display());
        Ok(())
    }

    pub async fn update(&self, config: &SyncConfig) -> anyhow::Result<()> {
        self.mirror(config)?.update(&self.base).await?;
        Ok(())
    }

    pub async fn push(&self, config: &SyncConfig) -> anyhow::Result<()> {
        if self.mirror(config)?.push(&self.base).await? == PushOutcome::NothingToPush {
            println!("nothing to push");
        }
        Ok(())
    }
}

#[derive(Args, Clone, Debug)]
pub struct PathArgs {
    #[command(flatten)]
    pub mirror: MirrorArgs,

    #[arg(long, help = "Output in JSON format")]
    pub json: bool,
}

impl PathArgs {
    pub fn run(&self, config: &SyncConfig) -> anyhow::Result<()> {
        let mirror = self.mirror.mirror(config)?;
        let path = mirror.mirror_path(&self.mirror.base);
        let cloned = mirror.is_cloned(&self.mirror.base);

        if self.json {
            let report = serde_json::json!({
                "remote": self.mirror.remote,
                "path": path.to_string_lossy(),
                "cloned": cloned,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", path.display());
            if !cloned {
                eprintln!("not cloned yet");
            }
        }
        Ok(())
    }
}
