// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Local mirrors of remote Mercurial repositories.
//!
//! [`NonLocalMirror`] keeps one on-disk mirror per remote and base directory
//! and delegates clone, pull and push to Mercurial through the [`Mercurial`]
//! trait. [`HgCli`] is the implementation backed by the `hg` executable.

pub mod config;
pub mod error;
pub mod handle;
pub mod hg;
pub mod hg_cli;
pub mod mirror;
pub mod remote;

pub use config::{ConfigOverrides, ConfigPaths, SyncConfig};
pub use error::{MirrorError, MirrorResult};
pub use handle::{RepoHandle, RepoLocation, UiConfig};
pub use hg::{CloneOptions, MARKER_DIR, Mercurial, PullOptions, PushOptions, PushOutcome};
pub use hg_cli::HgCli;
pub use mirror::NonLocalMirror;
pub use remote::{HgRemote, RemoteContext};
