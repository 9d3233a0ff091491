// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The context that owns a remote repository handle and decides where its
//! mirrors live.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::error::{MirrorError, MirrorResult};
use crate::handle::{RepoHandle, UiConfig};

/// Owner of the remote handle a mirror synchronises with
pub trait RemoteContext: Send + Sync {
    fn remote(&self) -> &RepoHandle;

    fn remote_mut(&mut self) -> &mut RepoHandle;

    /// Directory holding the mirror for `base`
    fn base_path(&self, base: &str) -> PathBuf;
}

/// A remote Mercurial repository identified by URL.
///
/// Mirrors live at `<mirror_root>/<base>/hg/<sha256(url)>`; an absolute
/// `base` replaces `mirror_root`.
#[derive(Debug, Clone)]
pub struct HgRemote {
    url: String,
    handle: RepoHandle,
    mirror_root: PathBuf,
}

impl HgRemote {
    pub fn new(url: impl Into<String>, mirror_root: impl Into<PathBuf>) -> MirrorResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(MirrorError::InvalidRemote("remote URL is empty".into()));
        }
        Ok(Self {
            handle: RepoHandle::remote(url.clone()),
            url,
            mirror_root: mirror_root.into(),
        })
    }

    /// Settings applied to every Mercurial call made against this remote
    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.handle = self.handle.with_ui(ui);
        self
    }

    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.url.as_bytes()))
    }
}

impl RemoteContext for HgRemote {
    fn remote(&self) -> &RepoHandle {
        &self.handle
    }

    fn remote_mut(&mut self) -> &mut RepoHandle {
        &mut self.handle
    }

    fn base_path(&self, base: &str) -> PathBuf {
        self.mirror_root.join(base).join("hg").join(self.digest())
    }
}
