// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! [`Mercurial`] backed by the `hg` executable.
//!
//! Every invocation runs with `HGPLAIN=1` so that user aliases and output
//! customisations in `hgrc` do not change behaviour, with stdin closed, and
//! with the handle's [`UiConfig`] passed as `--config` arguments.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{MirrorError, MirrorResult};
use crate::handle::{RepoHandle, UiConfig};
use crate::hg::{CloneOptions, MARKER_DIR, Mercurial, PullOptions, PushOptions, PushOutcome};

/// Exit status `hg push` uses when there were no outgoing changesets
const PUSH_NOTHING_TO_PUSH: i32 = 1;

#[derive(Debug, Clone)]
pub struct HgCli {
    binary: PathBuf,
    env: Vec<(String, String)>,
}

impl Default for HgCli {
    fn default() -> Self {
        Self::new("hg")
    }
}

impl HgCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            env: Vec::new(),
        }
    }

    /// Extra environment variables for every `hg` process
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run `hg` and return its output when the exit status is one of `accepted`
    /// (success is always accepted).
    async fn run(&self, args: Vec<OsString>, accepted: &[i32]) -> MirrorResult<Output> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(&args);
        cmd.env("HGPLAIN", "1");
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let command_line = render_command(&self.binary, &args);
        debug!(command = %command_line, "spawning hg");

        let output = cmd.output().await.map_err(|source| MirrorError::Spawn {
            program: self.binary.display().to_string(),
            source,
        })?;

        let code = output.status.code();
        if output.status.success() || code.is_some_and(|c| accepted.contains(&c)) {
            debug!(command = %command_line, ?code, "hg finished");
            return Ok(output);
        }

        Err(MirrorError::Command {
            command: command_line,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// `--config` overrides followed by `--quiet` when the configuration asks for it
fn ui_args(ui: &UiConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = ui.config_args().into_iter().map(OsString::from).collect();
    if ui.is_quiet() {
        args.push("--quiet".into());
    }
    args
}

fn local_repository_arg(local: &RepoHandle) -> Vec<OsString> {
    vec!["--repository".into(), local.location().as_os_str().to_os_string()]
}

pub(crate) fn clone_args(source: &RepoHandle, dest: &Path, options: CloneOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["clone".into()];
    if options.noupdate {
        args.push("--noupdate".into());
    }
    if options.pull {
        args.push("--pull".into());
    }
    args.extend(ui_args(source.ui()));
    args.push("--".into());
    args.push(source.location().as_os_str().to_os_string());
    args.push(dest.as_os_str().to_os_string());
    args
}

pub(crate) fn pull_args(
    local: &RepoHandle,
    remote: &RepoHandle,
    options: &PullOptions,
) -> Vec<OsString> {
    let mut args = local_repository_arg(local);
    args.push("pull".into());
    if options.force {
        args.push("--force".into());
    }
    args.extend(ui_args(local.ui()));
    args.push("--".into());
    args.push(remote.location().as_os_str().to_os_string());
    args
}

/// The push runs in the local repository, so the local handle's settings win
/// over the remote's.
pub(crate) fn push_args(
    local: &RepoHandle,
    remote: &RepoHandle,
    options: PushOptions,
) -> Vec<OsString> {
    let mut args = local_repository_arg(local);
    args.push("push".into());
    if options.force {
        args.push("--force".into());
    }
    args.extend(ui_args(&remote.ui().merged(local.ui())));
    args.push("--".into());
    args.push(remote.location().as_os_str().to_os_string());
    args
}

fn render_command(binary: &Path, args: &[OsString]) -> String {
    let mut rendered = binary.display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    rendered
}

/// Extract `6.5.2` from `Mercurial Distributed SCM (version 6.5.2)`
pub(crate) fn parse_version(stdout: &str) -> Option<String> {
    let line = stdout.lines().next()?;
    let start = line.find("(version ")? + "(version ".len();
    let end = line[start..].find(')')? + start;
    Some(line[start..end].trim().to_string())
}

#[async_trait]
impl Mercurial for HgCli {
    #[instrument(skip(self, source), fields(source = %source.location(), dest = %dest.display()))]
    async fn clone_repository(
        &self,
        source: &RepoHandle,
        dest: &Path,
        options: CloneOptions,
    ) -> MirrorResult<()> {
        self.run(clone_args(source, dest, options), &[]).await?;
        Ok(())
    }

    async fn repository(&self, ui: &UiConfig, path: &Path) -> MirrorResult<RepoHandle> {
        if !path.join(MARKER_DIR).is_dir() {
            return Err(MirrorError::MirrorNotFound {
                path: path.to_path_buf(),
            });
        }
        Ok(RepoHandle::local(path).with_ui(ui.clone()))
    }

    #[instrument(
        skip(self, local, remote),
        fields(local = %local.location(), remote = %remote.location())
    )]
    async fn pull(
        &self,
        local: &RepoHandle,
        remote: &RepoHandle,
        options: PullOptions,
    ) -> MirrorResult<()> {
        self.run(pull_args(local, remote, &options), &[]).await?;
        Ok(())
    }

    #[instrument(
        skip(self, local, remote),
        fields(local = %local.location(), remote = %remote.location())
    )]
    async fn push(
        &self,
        local: &RepoHandle,
        remote: &RepoHandle,
        options: PushOptions,
    ) -> MirrorResult<PushOutcome> {
        let output = self
            .run(push_args(local, remote, options), &[PUSH_NOTHING_TO_PUSH])
            .await?;
        if output.status.code() == Some(PUSH_NOTHING_TO_PUSH) {
            debug!("no outgoing changesets");
            Ok(PushOutcome::NothingToPush)
        } else {
            Ok(PushOutcome::Pushed)
        }
    }

    async fn version(&self) -> MirrorResult<String> {
        let output = self
            .run(vec!["--version".into(), "--quiet".into()], &[])
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_version(&stdout).unwrap_or_else(|| stdout.trim().to_string()))
    }
}
