// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Layered configuration.
//!
//! Precedence, lowest first: defaults < user file < `--config` file <
//! `HGSYNC_*` environment < command-line flags. Layers are merged as JSON
//! (objects deep-merged, scalars replaced) and deserialized once at the end.

use hgsync_logging::CliLogLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value as J;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::{MirrorError, MirrorResult};
use crate::handle::UiConfig;
use crate::hg_cli::HgCli;

/// Environment variable pointing at the directory holding `config.toml`.
/// Not itself a configuration key.
pub const HOME_ENV: &str = "HGSYNC_HOME";

const ENV_PREFIX: &str = "HGSYNC";

/// Top-level keys of [`SyncConfig`]
const CONFIG_KEYS: &[&str] = &["hg-binary", "mirror-root", "hg-config", "env", "log-level"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SyncConfig {
    /// Mercurial executable
    #[serde(default = "default_hg_binary")]
    pub hg_binary: PathBuf,

    /// Directory relative base identifiers are resolved against
    #[serde(default)]
    pub mirror_root: Option<PathBuf>,

    /// `[hg-config.<section>] key = value` overrides passed to every `hg` call
    #[serde(default)]
    pub hg_config: BTreeMap<String, BTreeMap<String, String>>,

    /// Extra environment for `hg` processes
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub log_level: Option<CliLogLevel>,
}

fn default_hg_binary() -> PathBuf {
    PathBuf::from("hg")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            hg_binary: default_hg_binary(),
            mirror_root: None,
            hg_config: BTreeMap::new(),
            env: BTreeMap::new(),
            log_level: None,
        }
    }
}

impl SyncConfig {
    pub fn mirror_root(&self) -> PathBuf {
        self.mirror_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn ui_config(&self) -> UiConfig {
        UiConfig::from_sections(&self.hg_config)
    }

    pub fn hg_cli(&self) -> HgCli {
        HgCli::new(&self.hg_binary).with_env(self.env.clone())
    }
}

/// Configuration files to read
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Read when present
    pub user: PathBuf,
    /// Given with `--config`; must exist
    pub cli_config: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover(cli_config: Option<PathBuf>) -> Self {
        Self {
            user: user_config_path(),
            cli_config,
        }
    }
}

/// `$HGSYNC_HOME/config.toml`, else the platform config directory
pub fn user_config_path() -> PathBuf {
    if let Ok(home) = std::env::var(HOME_ENV) {
        return PathBuf::from(home).join("config.toml");
    }
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("hgsync")
        .join("config.toml")
}

/// Values given as command-line flags
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub hg_binary: Option<PathBuf>,
    pub mirror_root: Option<PathBuf>,
    pub log_level: Option<CliLogLevel>,
}

impl ConfigOverrides {
    fn to_json(&self) -> J {
        let mut map = serde_json::Map::new();
        if let Some(binary) = &self.hg_binary {
            map.insert("hg-binary".into(), J::String(binary.display().to_string()));
        }
        if let Some(root) = &self.mirror_root {
            map.insert("mirror-root".into(), J::String(root.display().to_string()));
        }
        if let Some(level) = self.log_level {
            map.insert("log-level".into(), J::String(level.to_string()));
        }
        J::Object(map)
    }
}

/// Load configuration using the process environment
pub fn load(paths: &ConfigPaths, overrides: &ConfigOverrides) -> MirrorResult<SyncConfig> {
    load_with_env(paths, std::env::vars().collect(), overrides)
}

/// Load configuration with an explicit environment
pub fn load_with_env(
    paths: &ConfigPaths,
    env: HashMap<String, String>,
    overrides: &ConfigOverrides,
) -> MirrorResult<SyncConfig> {
    let mut json = serde_json::json!({});

    if paths.user.exists() {
        merge_two_json(&mut json, read_toml_layer(&paths.user)?);
    }
    if let Some(cli_config) = &paths.cli_config {
        if !cli_config.exists() {
            return Err(MirrorError::Config(format!(
                "config file {} does not exist",
                cli_config.display()
            )));
        }
        merge_two_json(&mut json, read_toml_layer(cli_config)?);
    }
    merge_two_json(&mut json, env_overlay(env)?);
    merge_two_json(&mut json, overrides.to_json());

    serde_json::from_value(json).map_err(|e| MirrorError::Config(e.to_string()))
}

fn read_toml_layer(path: &Path) -> MirrorResult<J> {
    let content = std::fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)
        .map_err(|e| MirrorError::Config(format!("{}: {}", path.display(), e)))?;
    serde_json::to_value(value).map_err(|e| MirrorError::Config(e.to_string()))
}

/// `HGSYNC_HG_BINARY` becomes `hg-binary`; `__` separates nested keys.
///
/// `HGSYNC_ENV__<NAME>` keeps `<NAME>` verbatim since environment variable
/// names are case-sensitive.
fn env_overlay(env: HashMap<String, String>) -> MirrorResult<J> {
    let prefix = format!("{}_", ENV_PREFIX);
    let env_table_prefix = format!("{}ENV__", prefix);

    let mut hg_env = serde_json::Map::new();
    let mut vars = HashMap::new();
    for (name, value) in env {
        if name == HOME_ENV || !name.starts_with(&prefix) {
            continue;
        }
        if let Some(hg_name) = name.strip_prefix(&env_table_prefix) {
            if !hg_name.is_empty() {
                hg_env.insert(hg_name.to_string(), J::String(value));
                continue;
            }
        }
        let key = top_level_key(&name[prefix.len()..]);
        if !CONFIG_KEYS.contains(&key.as_str()) {
            return Err(MirrorError::Config(format!(
                "environment variable {} does not name a configuration key",
                name
            )));
        }
        vars.insert(name, value);
    }

    let built = ::config::Config::builder()
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .convert_case(::config::Case::Kebab)
                .source(Some(vars)),
        )
        .build()
        .map_err(|e| MirrorError::Config(e.to_string()))?;

    let mut map = built
        .try_deserialize::<serde_json::Map<String, J>>()
        .map_err(|e| MirrorError::Config(e.to_string()))?;
    if !hg_env.is_empty() {
        merge_two_json(
            map.entry("env").or_insert_with(|| J::Object(serde_json::Map::new())),
            J::Object(hg_env),
        );
    }
    Ok(J::Object(map))
}

/// `HG_CONFIG__UI__SSH` -> `hg-config`
fn top_level_key(suffix: &str) -> String {
    let head = suffix.split("__").next().unwrap_or(suffix);
    head.to_lowercase().replace('_', "-")
}

/// Objects merge recursively; anything else in `layer` replaces `base`.
fn merge_two_json(base: &mut J, layer: J) {
    match (base, layer) {
        (J::Object(a), J::Object(b)) => {
            for (k, v) in b {
                merge_two_json(a.entry(k).or_insert(J::Null), v);
            }
        }
        (_, J::Null) => {}
        (a, b) => *a = b,
    }
}
