//! Configuration loading and validation for procs-tree.
//!
//! This module handles:
//! - Locating `config.toml` (CLI > env > XDG > system > defaults)
//! - Parsing with unknown keys rejected
//! - Environment overrides for the proc root and auxiliary policy
//! - Validation and conversion into [`BuildOptions`]

use crate::collect::{AuxPolicy, AuxSelection, ScanOptions, DEFAULT_PROC_ROOT};
use crate::tree::{default_scan_threads, BuildOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application name for XDG and system directories.
const APP_NAME: &str = "pstree";

/// Config file name inside a config directory.
const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "PSTREE_CONFIG";
pub const ENV_PROC_ROOT: &str = "PSTREE_PROC_ROOT";
pub const ENV_AUX_POLICY: &str = "PSTREE_AUX_POLICY";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value {value:?} in {var}: {message}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        message: String,
    },

    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for ps_common::Error {
    fn from(e: ConfigError) -> Self {
        ps_common::Error::Config(e.to_string())
    }
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeConfig {
    /// Directory holding one subdirectory per process.
    pub proc_root: PathBuf,
    pub aux_policy: AuxPolicy,
    /// Auxiliary fields to read.
    pub aux: AuxSelection,
    /// Scan workers; absent means one per available CPU.
    pub scan_threads: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            aux_policy: AuxPolicy::default(),
            aux: AuxSelection::default(),
            scan_threads: None,
        }
    }
}

impl TreeConfig {
    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_threads == Some(0) {
            return Err(ConfigError::ValidationError(
                "scan_threads must be at least 1".to_string(),
            ));
        }
        if self.proc_root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "proc_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            scan: ScanOptions {
                aux_policy: self.aux_policy,
                aux_fields: self.aux,
            },
            scan_threads: self.scan_threads.unwrap_or_else(default_scan_threads),
        }
    }
}

/// Where the configuration file was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,
    /// Named by `PSTREE_CONFIG`.
    Environment,
    /// Found in the XDG config directory.
    XdgConfig,
    /// Found in /etc/pstree/.
    SystemConfig,
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Configuration resolution options.
#[derive(Debug, Default)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority). Must exist.
    pub config_path: Option<PathBuf>,
    /// Skip XDG and system locations.
    pub skip_discovery: bool,
}

/// Values taken from the environment, captured once so resolution can be
/// tested without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub config_path: Option<String>,
    pub proc_root: Option<String>,
    pub aux_policy: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        EnvOverrides {
            config_path: non_empty_var(ENV_CONFIG_PATH),
            proc_root: non_empty_var(ENV_PROC_ROOT),
            aux_policy: non_empty_var(ENV_AUX_POLICY),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: TreeConfig,
    /// File the config was read from (None if using defaults).
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

impl ResolvedConfig {
    pub fn build_options(&self) -> BuildOptions {
        self.config.build_options()
    }
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI path (via ConfigOptions)
/// 2. `PSTREE_CONFIG`
/// 3. XDG config home (~/.config/pstree/config.toml)
/// 4. /etc/pstree/config.toml
/// 5. Built-in defaults
///
/// `PSTREE_PROC_ROOT` and `PSTREE_AUX_POLICY` are applied on top of
/// whatever file was loaded.
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with_env(options, &EnvOverrides::from_env())
}

/// [`load_config`] with an explicit environment.
pub fn load_config_with_env(
    options: &ConfigOptions,
    env: &EnvOverrides,
) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = resolve_config_path(options, env)?;

    let mut config = match &path {
        Some(path) => load_config_file(path)?,
        None => TreeConfig::default(),
    };
    apply_env_overrides(&mut config, env)?;
    config.validate()?;

    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

/// Parse and validate one config file.
pub fn load_config_file(path: &Path) -> Result<TreeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn resolve_config_path(
    options: &ConfigOptions,
    env: &EnvOverrides,
) -> Result<(Option<PathBuf>, ConfigSource), ConfigError> {
    // Explicitly named files must exist; discovered ones are optional.
    if let Some(path) = &options.config_path {
        if !path.exists() {
            return Err(ConfigError::NotFound { path: path.clone() });
        }
        return Ok((Some(path.clone()), ConfigSource::CliArgument));
    }

    if let Some(env_path) = &env.config_path {
        let path = PathBuf::from(env_path);
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return Ok((Some(path), ConfigSource::Environment));
    }

    if options.skip_discovery {
        return Ok((None, ConfigSource::BuiltinDefault));
    }

    if let Some(path) = xdg_config_dir().map(|d| d.join(CONFIG_FILENAME)) {
        if path.is_file() {
            return Ok((Some(path), ConfigSource::XdgConfig));
        }
    }

    let system_path = system_config_dir().join(CONFIG_FILENAME);
    if system_path.is_file() {
        return Ok((Some(system_path), ConfigSource::SystemConfig));
    }

    Ok((None, ConfigSource::BuiltinDefault))
}

fn apply_env_overrides(config: &mut TreeConfig, env: &EnvOverrides) -> Result<(), ConfigError> {
    if let Some(root) = &env.proc_root {
        config.proc_root = PathBuf::from(root);
    }
    if let Some(policy) = &env.aux_policy {
        config.aux_policy = policy.parse().map_err(|message| ConfigError::InvalidEnv {
            var: ENV_AUX_POLICY,
            value: policy.clone(),
            message,
        })?;
    }
    Ok(())
}

/// Get the XDG config directory for pstree.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
