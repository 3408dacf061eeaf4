//! KDL schema for config.kdl.
//!
//! ```kdl
//! output-format "human"   // or "json"
//! roster-file ".pairs"
//! git-timeout-ms 1000
//! fallback-label "git pair"
//! ```

use kdl::KdlDocument;
use serde::{Deserialize, Serialize};

/// Largest accepted `git-timeout-ms`.
pub const MAX_GIT_TIMEOUT_MS: u64 = 60_000;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl. Every field is optional; unset
/// fields fall through to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPairConfig {
    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// Roster file name, relative to the repository root
    pub roster_file: Option<String>,

    /// Bound on a single git invocation
    pub git_timeout_ms: Option<u64>,

    /// Label shown when nobody is paired
    pub fallback_label: Option<String>,
}

impl GitPairConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ms) = self.git_timeout_ms
            && !(1..=MAX_GIT_TIMEOUT_MS).contains(&ms)
        {
            return Err(format!(
                "git-timeout-ms must be 1-{}, got {}",
                MAX_GIT_TIMEOUT_MS, ms
            ));
        }
        if let Some(ref file) = self.roster_file
            && file.trim().is_empty()
        {
            return Err("roster-file must not be empty".to_string());
        }
        Ok(())
    }

    /// Parse config from a KDL document. Values of the wrong type or out of
    /// range are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = string_entry(doc, "output-format") {
            config.output_format = OutputFormat::parse(s);
        }

        if let Some(s) = string_entry(doc, "roster-file")
            && !s.trim().is_empty()
        {
            config.roster_file = Some(s.to_string());
        }

        if let Some(node) = doc.get("git-timeout-ms")
            && let Some(entry) = node.entries().first()
            && let Some(i) = entry.value().as_integer()
            && (1..=MAX_GIT_TIMEOUT_MS as i128).contains(&i)
        {
            config.git_timeout_ms = Some(i as u64);
        }

        if let Some(s) = string_entry(doc, "fallback-label") {
            config.fallback_label = Some(s.to_string());
        }

        config
    }
}

fn string_entry<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}
