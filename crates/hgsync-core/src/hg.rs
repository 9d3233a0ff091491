// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The Mercurial operations a mirror delegates to

use async_trait::async_trait;
use std::path::Path;

use crate::error::MirrorResult;
use crate::handle::{RepoHandle, UiConfig};

/// Subdirectory whose presence marks a directory as a Mercurial repository
pub const MARKER_DIR: &str = ".hg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloneOptions {
    /// Leave the working directory empty
    pub noupdate: bool,
    /// Transfer changesets with the pull protocol instead of copying store files
    pub pull: bool,
}

/// Pulls always request every head the remote has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PullOptions {
    /// Accept changesets unrelated to the local history
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushOptions {
    /// Allow creating new heads on the remote
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    NothingToPush,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mercurial: Send + Sync {
    /// Clone `source` into `dest` using the source handle's UI configuration
    async fn clone_repository(
        &self,
        source: &RepoHandle,
        dest: &Path,
        options: CloneOptions,
    ) -> MirrorResult<()>;

    /// Open the existing repository at `path`; the handle starts with `ui`
    async fn repository(&self, ui: &UiConfig, path: &Path) -> MirrorResult<RepoHandle>;

    /// Pull from `remote` into `local`
    async fn pull(
        &self,
        local: &RepoHandle,
        remote: &RepoHandle,
        options: PullOptions,
    ) -> MirrorResult<()>;

    /// Push from `local` to `remote`
    async fn push(
        &self,
        local: &RepoHandle,
        remote: &RepoHandle,
        options: PushOptions,
    ) -> MirrorResult<PushOutcome>;

    /// Version string reported by Mercurial, e.g. `6.5.2`
    async fn version(&self) -> MirrorResult<String>;
}
