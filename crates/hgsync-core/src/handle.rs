// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Repository handles and their per-handle UI configuration

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// `section.key = value` overrides attached to a repository handle.
///
/// Rendered as `--config section.key=value` arguments when Mercurial runs
/// against the handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiConfig {
    entries: BTreeMap<(String, String), String>,
}

impl UiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `[section] key = value` tables as found in the config file
    pub fn from_sections(sections: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let mut ui = Self::new();
        for (section, values) in sections {
            for (key, value) in values {
                ui.set_config(section, key, value);
            }
        }
        ui
    }

    pub fn set_config(&mut self, section: &str, key: &str, value: &str) {
        self.entries
            .insert((section.to_string(), key.to_string()), value.to_string());
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&(section.to_string(), key.to_string()))
            .map(String::as_str)
    }

    pub fn set_quiet(&mut self) {
        self.set_config("ui", "quiet", "true");
    }

    /// Whether `ui.quiet` holds one of Mercurial's true spellings
    pub fn is_quiet(&self) -> bool {
        self.get("ui", "quiet").is_some_and(|v| {
            matches!(
                v.to_ascii_lowercase().as_str(),
                "1" | "yes" | "true" | "on" | "always"
            )
        })
    }

    /// Entries of `self` overlaid with those of `other`
    pub fn merged(&self, other: &UiConfig) -> UiConfig {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        UiConfig { entries }
    }

    pub fn config_args(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|((section, key), value)| {
                ["--config".to_string(), format!("{}.{}={}", section, key, value)]
            })
            .collect()
    }
}

/// Where a repository lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    /// Anything Mercurial accepts as a peer: URL, ssh path, or remote path
    Remote(String),
    Local(PathBuf),
}

impl RepoLocation {
    pub fn as_os_str(&self) -> &OsStr {
        match self {
            RepoLocation::Remote(url) => OsStr::new(url),
            RepoLocation::Local(path) => path.as_os_str(),
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            RepoLocation::Local(path) => Some(path),
            RepoLocation::Remote(_) => None,
        }
    }
}

impl fmt::Display for RepoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoLocation::Remote(url) => write!(f, "{}", url),
            RepoLocation::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A repository together with the UI configuration Mercurial uses for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    location: RepoLocation,
    ui: UiConfig,
}

impl RepoHandle {
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            location: RepoLocation::Remote(url.into()),
            ui: UiConfig::new(),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            location: RepoLocation::Local(path.into()),
            ui: UiConfig::new(),
        }
    }

    pub fn with_ui(mut self, ui: UiConfig) -> Self {
        self.ui = ui;
        self
    }

    pub fn location(&self) -> &RepoLocation {
        &self.location
    }

    pub fn ui(&self) -> &UiConfig {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiConfig {
        &mut self.ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_flag_round_trip() {
        let mut ui = UiConfig::new();
        assert!(!ui.is_quiet());
        ui.set_quiet();
        assert!(ui.is_quiet());
        assert_eq!(ui.get("ui", "quiet"), Some("true"));

        ui.set_config("ui", "quiet", "off");
        assert!(!ui.is_quiet());
        ui.set_config("ui", "quiet", "Yes");
        assert!(ui.is_quiet());
    }

    #[test]
    fn config_args_are_sorted_pairs() {
        let mut ui = UiConfig::new();
        ui.set_config("ui", "ssh", "ssh -C");
        ui.set_config("extensions", "largefiles", "");
        assert_eq!(
            ui.config_args(),
            vec![
                "--config",
                "extensions.largefiles=",
                "--config",
                "ui.ssh=ssh -C"
            ]
        );
    }

    #[test]
    fn merged_prefers_other() {
        let mut base = UiConfig::new();
        base.set_config("ui", "quiet", "false");
        base.set_config("ui", "username", "mirror");
        let mut overlay = UiConfig::new();
        overlay.set_quiet();

        let merged = base.merged(&overlay);
        assert!(merged.is_quiet());
        assert_eq!(merged.get("ui", "username"), Some("mirror"));
    }

    #[test]
    fn from_sections_flattens_tables() {
        let mut sections = BTreeMap::new();
        sections.insert(
            "ui".to_string(),
            BTreeMap::from([("ssh".to_string(), "ssh -i key".to_string())]),
        );
        let ui = UiConfig::from_sections(&sections);
        assert_eq!(ui.get("ui", "ssh"), Some("ssh -i key"));
        assert_eq!(ui.config_args(), vec!["--config", "ui.ssh=ssh -i key"]);
    }

    #[test]
    fn handles_expose_location() {
        let remote = RepoHandle::remote("https://hg.example.org/repo");
        assert_eq!(remote.location().to_string(), "https://hg.example.org/repo");
        assert!(remote.location().local_path().is_none());

        let local = RepoHandle::local("/srv/mirror");
        assert_eq!(local.location().local_path(), Some(Path::new("/srv/mirror")));
    }
}
