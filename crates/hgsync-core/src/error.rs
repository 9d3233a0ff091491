// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for mirror operations

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

pub type MirrorResult<T> = std::result::Result<T, MirrorError>;

#[derive(Debug, Error)]
pub enum MirrorError {
    /// Update or push was requested before the mirror was cloned
    #[error("could not find repo at {}", path.display())]
    MirrorNotFound { path: PathBuf },

    #[error("failed to create mirror directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Mercurial ran and reported failure; its stderr is passed through untouched
    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("invalid remote: {0}")]
    InvalidRemote(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    pub fn is_mirror_not_found(&self) -> bool {
        matches!(self, MirrorError::MirrorNotFound { .. })
    }
}
