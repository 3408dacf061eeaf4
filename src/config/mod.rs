//! User preferences for the `git-pair` command.
//!
//! ## config.kdl
//!
//! Located at `$GIT_PAIR_CONFIG_DIR/config.kdl`, or
//! `~/.config/git-pair/config.kdl` when the variable is unset.
//!
//! Contains:
//! - `output-format` - "json" or "human"
//! - `roster-file` - roster file name at the repository root (default `.pairs`)
//! - `git-timeout-ms` - bound on each git invocation (1-60000)
//! - `fallback-label` - label shown when nobody is paired
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DEFAULT_ROSTER_FILE, GIT_TIMEOUT_ENV, Resolved, ResolvedConfig, ValueSource,
    resolve_config, resolve_layers,
};
pub use schema::{GitPairConfig, MAX_GIT_TIMEOUT_MS, OutputFormat};

use crate::{Error, Result};
use kdl::KdlDocument;
use std::path::PathBuf;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "GIT_PAIR_CONFIG_DIR";

const CONFIG_FILE: &str = "config.kdl";

/// Directory holding config.kdl.
pub fn system_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("git-pair"))
}

/// Full path of config.kdl, if a config directory can be determined.
pub fn system_config_path() -> Option<PathBuf> {
    system_config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Read config.kdl. A missing file yields an empty config.
pub fn read_system_config() -> Result<GitPairConfig> {
    let Some(path) = system_config_path() else {
        return Ok(GitPairConfig::default());
    };
    if !path.exists() {
        return Ok(GitPairConfig::default());
    }

    let content = std::fs::read_to_string(&path)?;
    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::InvalidInput(format!("Invalid {}: {}", path.display(), e)))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(GitPairConfig::from_kdl(&doc))
}
