// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Result;
use hgsync_cli::{Cli, Parser};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli.load_config()?;
    cli.logging
        .init("hgsync", config.log_level.unwrap_or_default())?;
    tracing::debug!(?config, "configuration loaded");

    cli.run(&config).await
}
