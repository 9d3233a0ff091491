// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Mirror lifecycle: clone once, then pull into it and push from it.

use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::error::{MirrorError, MirrorResult};
use crate::hg::{CloneOptions, MARKER_DIR, Mercurial, PullOptions, PushOptions, PushOutcome};
use crate::remote::RemoteContext;

/// Keeps a local mirror of the remote owned by `C` in sync through `M`.
///
/// Every handle is switched to quiet output before Mercurial runs against it.
pub struct NonLocalMirror<C, M> {
    context: C,
    hg: M,
}

impl<C: RemoteContext, M: Mercurial> NonLocalMirror<C, M> {
    pub fn new(context: C, hg: M) -> Self {
        Self { context, hg }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn mirror_path(&self, base: &str) -> PathBuf {
        self.context.base_path(base)
    }

    pub fn is_cloned(&self, base: &str) -> bool {
        self.mirror_path(base).join(MARKER_DIR).exists()
    }

    /// Clone the remote into the mirror for `base` unless it is already there.
    ///
    /// The clone does not check out a working copy and uses the pull protocol.
    /// Returns the mirror path in both cases.
    #[instrument(skip(self))]
    pub async fn clone(&mut self, base: &str) -> MirrorResult<PathBuf> {
        let path = self.mirror_path(base);

        if path.join(MARKER_DIR).exists() {
            debug!(path = %path.display(), "mirror already cloned");
            return Ok(path);
        }

        if !path.exists() {
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| MirrorError::CreateDir {
                    path: path.clone(),
                    source,
                })?;
        }

        self.context.remote_mut().ui_mut().set_quiet();
        self.hg
            .clone_repository(
                self.context.remote(),
                &path,
                CloneOptions {
                    noupdate: true,
                    pull: true,
                },
            )
            .await?;

        info!(path = %path.display(), "cloned mirror");
        Ok(path)
    }

    /// Pull every remote head into the mirror, accepting unrelated history.
    #[instrument(skip(self))]
    pub async fn update(&mut self, base: &str) -> MirrorResult<()> {
        let path = self.existing_mirror(base)?;

        let mut repo = self.hg.repository(self.context.remote().ui(), &path).await?;
        repo.ui_mut().set_quiet();

        self.hg
            .pull(&repo, self.context.remote(), PullOptions { force: true })
            .await?;

        info!(path = %path.display(), "updated mirror");
        Ok(())
    }

    /// Push mirror changesets to the remote without forcing new remote heads.
    #[instrument(skip(self))]
    pub async fn push(&mut self, base: &str) -> MirrorResult<PushOutcome> {
        let path = self.existing_mirror(base)?;

        let mut repo = self.hg.repository(self.context.remote().ui(), &path).await?;

        self.context.remote_mut().ui_mut().set_quiet();
        repo.ui_mut().set_quiet();

        let outcome = self
            .hg
            .push(&repo, self.context.remote(), PushOptions { force: false })
            .await?;

        info!(path = %path.display(), ?outcome, "pushed mirror");
        Ok(outcome)
    }

    fn existing_mirror(&self, base: &str) -> MirrorResult<PathBuf> {
        let path = self.mirror_path(base);
        if !path.exists() {
            return Err(MirrorError::MirrorNotFound { path });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RepoHandle;
    use crate::hg::MockMercurial;
    use crate::remote::HgRemote;
    use mockall::predicate::always;
    use std::path::Path;
    use tempfile::TempDir;

    const URL: &str = "https://hg.example.org/project";

    fn remote(root: &Path) -> HgRemote {
        HgRemote::new(URL, root).unwrap()
    }

    fn mark_cloned(path: &Path) {
        std::fs::create_dir_all(path.join(MARKER_DIR)).unwrap();
    }

    fn expect_open(hg: &mut MockMercurial) {
        hg.expect_repository()
            .times(1)
            .returning(|ui, path| Ok(RepoHandle::local(path).with_ui(ui.clone())));
    }

    #[tokio::test]
    async fn clone_creates_directory_and_clones_quietly() {
        let root = TempDir::new().unwrap();
        let mut hg = MockMercurial::new();
        hg.expect_clone_repository()
            .withf(|source, _dest, options| {
                source.ui().is_quiet()
                    && source.location().to_string() == URL
                    && options.noupdate
                    && options.pull
            })
            .times(1)
            .returning(|_, dest, _| {
                assert!(dest.is_dir(), "mirror directory exists before cloning");
                mark_cloned(dest);
                Ok(())
            });

        let mut mirror = NonLocalMirror::new(remote(root.path()), hg);
        let path = mirror.clone("work").await.unwrap();

        assert_eq!(path, mirror.mirror_path("work"));
        assert!(path.starts_with(root.path().join("work").join("hg")));
        assert!(path.join(MARKER_DIR).is_dir());
        assert!(mirror.is_cloned("work"));
    }

    #[tokio::test]
    async fn clone_twice_is_a_no_op() {
        let root = TempDir::new().unwrap();
        let mut hg = MockMercurial::new();
        hg.expect_clone_repository()
            .times(1)
            .returning(|_, dest, _| {
                mark_cloned(dest);
                Ok(())
            });

        let mut mirror = NonLocalMirror::new(remote(root.path()), hg);
        let first = mirror.clone("work").await.unwrap();
        let second = mirror.clone("work").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn clone_reuses_existing_empty_directory() {
        let root = TempDir::new().unwrap();
        let context = remote(root.path());
        std::fs::create_dir_all(context.base_path("work")).unwrap();

        let mut hg = MockMercurial::new();
        hg.expect_clone_repository()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut mirror = NonLocalMirror::new(context, hg);
        mirror.clone("work").await.unwrap();
    }

    #[tokio::test]
    async fn clone_propagates_mercurial_failure() {
        let root = TempDir::new().unwrap();
        let mut hg = MockMercurial::new();
        hg.expect_clone_repository()
            .returning(|_, _, _| Err(MirrorError::InvalidRemote("unreachable".into())));

        let mut mirror = NonLocalMirror::new(remote(root.path()), hg);
        let err = mirror.clone("work").await.unwrap_err();
        assert!(matches!(err, MirrorError::InvalidRemote(_)));
        assert!(!mirror.is_cloned("work"));
    }

    #[tokio::test]
    async fn update_without_clone_names_expected_path() {
        let root = TempDir::new().unwrap();
        let mut hg = MockMercurial::new();
        hg.expect_repository().never();
        hg.expect_pull().never();

        let mut mirror = NonLocalMirror::new(remote(root.path()), hg);
        let expected = mirror.mirror_path("work");
        let err = mirror.update("work").await.unwrap_err();

        match &err {
            MirrorError::MirrorNotFound { path } => assert_eq!(path, &expected),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            format!("could not find repo at {}", expected.display())
        );
    }

    #[tokio::test]
    async fn push_without_clone_fails() {
        let root = TempDir::new().unwrap();
        let mut hg = MockMercurial::new();
        hg.expect_push().never();

        let mut mirror = NonLocalMirror::new(remote(root.path()), hg);
        let err = mirror.push("work").await.unwrap_err();
        assert!(err.is_mirror_not_found());
    }

    #[tokio::test]
    async fn update_pulls_all_heads_forced_and_quiet() {
        let root = TempDir::new().unwrap();
        let context = remote(root.path());
        mark_cloned(&context.base_path("work"));

        let mut hg = MockMercurial::new();
        expect_open(&mut hg);
        hg.expect_pull()
            .withf(|local, remote, options| {
                local.ui().is_quiet()
                    && local.location().local_path().is_some()
                    && remote.location().to_string() == URL
                    && options.force
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut mirror = NonLocalMirror::new(context, hg);
        mirror.update("work").await.unwrap();
    }

    #[tokio::test]
    async fn update_opens_mirror_with_remote_settings() {
        let root = TempDir::new().unwrap();
        let mut ui = crate::handle::UiConfig::new();
        ui.set_config("ui", "ssh", "ssh -C");
        let context = remote(root.path()).with_ui(ui);
        mark_cloned(&context.base_path("work"));

        let mut hg = MockMercurial::new();
        hg.expect_repository()
            .withf(|ui, _| ui.get("ui", "ssh") == Some("ssh -C"))
            .times(1)
            .returning(|ui, path| Ok(RepoHandle::local(path).with_ui(ui.clone())));
        hg.expect_pull()
            .withf(|local, _, _| local.ui().get("ui", "ssh") == Some("ssh -C"))
            .returning(|_, _, _| Ok(()));

        let mut mirror = NonLocalMirror::new(context, hg);
        mirror.update("work").await.unwrap();
    }

    #[tokio::test]
    async fn push_is_never_forced_and_quiets_both_handles() {
        let root = TempDir::new().unwrap();
        let context = remote(root.path());
        mark_cloned(&context.base_path("work"));

        let mut hg = MockMercurial::new();
        expect_open(&mut hg);
        hg.expect_push()
            .withf(|local, remote, options| {
                local.ui().is_quiet() && remote.ui().is_quiet() && !options.force
            })
            .times(1)
            .returning(|_, _, _| Ok(PushOutcome::Pushed));

        let mut mirror = NonLocalMirror::new(context, hg);
        assert_eq!(mirror.push("work").await.unwrap(), PushOutcome::Pushed);
        assert!(mirror.context().remote().ui().is_quiet());
    }

    #[tokio::test]
    async fn push_reports_nothing_to_push() {
        let root = TempDir::new().unwrap();
        let context = remote(root.path());
        mark_cloned(&context.base_path("work"));

        let mut hg = MockMercurial::new();
        expect_open(&mut hg);
        hg.expect_push()
            .with(always(), always(), always())
            .returning(|_, _, _| Ok(PushOutcome::NothingToPush));

        let mut mirror = NonLocalMirror::new(context, hg);
        assert_eq!(mirror.push("work").await.unwrap(), PushOutcome::NothingToPush);
    }

    #[tokio::test]
    async fn distinct_bases_get_distinct_mirrors() {
        let root = TempDir::new().unwrap();
        let mut hg = MockMercurial::new();
        hg.expect_clone_repository()
            .times(2)
            .returning(|_, dest, _| {
                mark_cloned(dest);
                Ok(())
            });

        let mut mirror = NonLocalMirror::new(remote(root.path()), hg);
        let a = mirror.clone("a").await.unwrap();
        let b = mirror.clone("b").await.unwrap();
        assert_ne!(a, b);
    }
}
