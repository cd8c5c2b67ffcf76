//! CLI subcommands

pub mod check;
pub mod config;
pub mod status;

use std::path::{Path, PathBuf};

use grouptrack_core::config::Config;

/// Environment variable naming the configuration file, shared with the daemon
pub const CONFIG_ENV: &str = "GROUPTRACK_CONFIG";

/// `--config` wins over `GROUPTRACK_CONFIG`, which wins over the default path
pub fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    std::env::var_os(CONFIG_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path)
}
