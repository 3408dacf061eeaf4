//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`GIT_PAIR_TIMEOUT_MS`)
//! 3. System config.kdl (`~/.config/git-pair/config.kdl`)
//! 4. Built-in defaults

use crate::config::{GitPairConfig, OutputFormat, read_system_config};
use crate::git::DEFAULT_TIMEOUT_MS;
use crate::pairing::DEFAULT_FALLBACK_LABEL;
use crate::{Error, Result};

/// Environment variable overriding `git-timeout-ms`.
pub const GIT_TIMEOUT_ENV: &str = "GIT_PAIR_TIMEOUT_MS";

/// Roster file looked up at the repository root by default.
pub const DEFAULT_ROSTER_FILE: &str = ".pairs";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from the system config.kdl
    System,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::System => write!(f, "system"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_format: Resolved<OutputFormat>,
    pub roster_file: Resolved<String>,
    pub git_timeout_ms: Resolved<u64>,
    pub fallback_label: Resolved<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            roster_file: Resolved::new(DEFAULT_ROSTER_FILE.to_string(), ValueSource::Default),
            git_timeout_ms: Resolved::new(DEFAULT_TIMEOUT_MS, ValueSource::Default),
            fallback_label: Resolved::new(
                DEFAULT_FALLBACK_LABEL.to_string(),
                ValueSource::Default,
            ),
        }
    }
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn roster_file(&self) -> &str {
        &self.roster_file.value
    }

    pub fn git_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.git_timeout_ms.value)
    }

    pub fn fallback_label(&self) -> &str {
        &self.fallback_label.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub roster_file: Option<String>,
    pub git_timeout_ms: Option<u64>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_roster_file(mut self, file: impl Into<String>) -> Self {
        self.roster_file = Some(file.into());
        self
    }

    pub fn with_git_timeout_ms(mut self, ms: u64) -> Self {
        self.git_timeout_ms = Some(ms);
        self
    }

    /// Reject override values the config file would also reject.
    pub fn validate(&self) -> Result<()> {
        let as_config = GitPairConfig {
            output_format: self.output_format,
            roster_file: self.roster_file.clone(),
            git_timeout_ms: self.git_timeout_ms,
            fallback_label: None,
        };
        as_config.validate().map_err(Error::InvalidInput)
    }
}

/// Resolve configuration from the system config file, the environment and
/// the CLI overrides.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    overrides.validate()?;
    let system = read_system_config()?;
    let env_timeout = std::env::var(GIT_TIMEOUT_ENV).ok();
    Ok(resolve_layers(&system, env_timeout.as_deref(), overrides))
}

/// Resolve from already loaded layers.
///
/// An environment timeout that is not a number in range is ignored.
pub fn resolve_layers(
    system: &GitPairConfig,
    env_timeout: Option<&str>,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let mut result = ResolvedConfig::default();

    if let Some(format) = overrides.output_format {
        result.output_format = Resolved::new(format, ValueSource::CliFlag);
    } else if let Some(format) = system.output_format {
        result.output_format = Resolved::new(format, ValueSource::System);
    }

    if let Some(ref file) = overrides.roster_file {
        result.roster_file = Resolved::new(file.clone(), ValueSource::CliFlag);
    } else if let Some(ref file) = system.roster_file {
        result.roster_file = Resolved::new(file.clone(), ValueSource::System);
    }

    let env_timeout = env_timeout.and_then(|raw| {
        let parsed = raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|ms| (1..=super::schema::MAX_GIT_TIMEOUT_MS).contains(ms));
        if parsed.is_none() {
            tracing::warn!(value = raw, "ignoring invalid {}", GIT_TIMEOUT_ENV);
        }
        parsed
    });
    if let Some(ms) = overrides.git_timeout_ms {
        result.git_timeout_ms = Resolved::new(ms, ValueSource::CliFlag);
    } else if let Some(ms) = env_timeout {
        result.git_timeout_ms =
            Resolved::new(ms, ValueSource::EnvVar(GIT_TIMEOUT_ENV.to_string()));
    } else if let Some(ms) = system.git_timeout_ms {
        result.git_timeout_ms = Resolved::new(ms, ValueSource::System);
    }

    if let Some(ref label) = system.fallback_label {
        result.fallback_label = Resolved::new(label.clone(), ValueSource::System);
    }

    result
}
