//! Command implementations for the git-pair CLI.
//!
//! Each command returns a result struct implementing [`CommandResult`], so
//! the binary can print it as JSON or as text for humans.

use crate::config::{ResolvedConfig, system_config_path};
use crate::git::{GitConfigStore, GitRunner};
use crate::pairing::{
    CombinedIdentity, Discard, IdentityStore, PairSession, RosterConfig, Scope, Toggle,
    load_with_diagnostics,
};
use crate::{Error, Result, yaml};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait CommandResult {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

// === Roster loading ===

/// Where the roster is read from for this repository.
pub fn roster_path(repo_path: &Path, config: &ResolvedConfig) -> PathBuf {
    repo_path.join(config.roster_file())
}

/// Read and parse the roster, keeping the entries that had to be dropped.
///
/// A missing file is [`Error::NoRoster`]. Bytes that are not valid UTF-8 are
/// replaced rather than rejected, like every other anomaly in the file.
pub fn load_roster(repo_path: &Path, config: &ResolvedConfig) -> Result<(RosterConfig, Vec<Discard>)> {
    let path = roster_path(repo_path, config);
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NoRoster(path));
        }
        Err(e) => {
            return Err(Error::Other(format!(
                "Could not read roster {}: {}",
                path.display(),
                e
            )));
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    Ok(load_with_diagnostics(&yaml::parse(&text)))
}

/// Build a session for the repository, backed by its git config.
pub fn open_session(
    repo_path: &Path,
    config: &ResolvedConfig,
) -> Result<PairSession<GitConfigStore>> {
    let (roster, _) = load_roster(repo_path, config)?;
    let runner = GitRunner::new(repo_path).with_timeout(config.git_timeout());
    Ok(start_session(roster, GitConfigStore::with_runner(runner), config))
}

/// Create a session over any store and pick up the pair it already holds.
pub fn start_session<S: IdentityStore>(
    roster: RosterConfig,
    store: S,
    config: &ResolvedConfig,
) -> PairSession<S> {
    let session = PairSession::new(roster, store).with_fallback_label(config.fallback_label());
    session.initialize();
    session
}

// === Status ===

#[derive(Serialize)]
pub struct StatusResult {
    pub paired: bool,
    pub tags: Vec<String>,
    pub display_name: String,
    #[serde(flatten)]
    pub identity: CombinedIdentity,
    pub scope: Scope,
}

impl CommandResult for StatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if !self.paired {
            return format!("{}: nobody paired", self.display_name);
        }
        let mut lines = vec![self.display_name.clone()];
        if let Some(ref email) = self.identity.email {
            lines.push(format!("  email: {}", email));
        }
        lines.push(format!("  tags:  {}", self.tags.join(", ")));
        lines.push(format!("  scope: {}", self.scope));
        lines.join("\n")
    }
}

/// Current pair of a session.
pub fn status<S: IdentityStore>(session: &PairSession<S>) -> StatusResult {
    let tags: Vec<String> = session.selection().into_iter().map(|p| p.tag).collect();
    StatusResult {
        paired: !tags.is_empty(),
        tags,
        display_name: session.display_name(),
        identity: session.identity(),
        scope: session.scope(),
    }
}

// === List ===

#[derive(Serialize)]
pub struct MemberEntry {
    pub tag: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub selected: bool,
}

#[derive(Serialize)]
pub struct ListResult {
    pub members: Vec<MemberEntry>,
}

impl CommandResult for ListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.members.is_empty() {
            return "No team members in roster.".to_string();
        }
        let width = self.members.iter().map(|m| m.tag.len()).max().unwrap_or(0);
        self.members
            .iter()
            .map(|m| {
                let marker = if m.selected { '*' } else { ' ' };
                let name = m.name.as_deref().unwrap_or("(no name)");
                let email = m
                    .email
                    .as_deref()
                    .map_or_else(|| "(no email)".to_string(), |e| format!("<{}>", e));
                format!("{} {:width$}  {} {}", marker, m.tag, name, email, width = width)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Roster members in file order, marking the current pair.
pub fn list<S: IdentityStore>(session: &PairSession<S>) -> ListResult {
    let members = session
        .roster()
        .participants
        .iter()
        .map(|p| MemberEntry {
            tag: p.tag.clone(),
            name: p.display_name.clone(),
            email: p.email.clone(),
            selected: session.is_selected(p),
        })
        .collect();
    ListResult { members }
}

// === Toggle ===

#[derive(Serialize)]
pub struct ToggleEntry {
    pub tag: String,
    pub result: Toggle,
}

#[derive(Serialize)]
pub struct ToggleResult {
    pub toggled: Vec<ToggleEntry>,
    pub status: StatusResult,
}

impl CommandResult for ToggleResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self
            .toggled
            .iter()
            .map(|t| match t.result {
                Toggle::Paired => format!("+ {}", t.tag),
                Toggle::Unpaired => format!("- {}", t.tag),
                Toggle::Ignored => format!("  {} (no email, ignored)", t.tag),
            })
            .collect();
        lines.push(self.status.to_human());
        lines.join("\n")
    }
}

/// Toggle each tag in order.
///
/// Every tag is checked against the roster first, so an unknown tag fails
/// the command before anything is written.
pub fn toggle<S: IdentityStore>(session: &PairSession<S>, tags: &[String]) -> Result<ToggleResult> {
    if let Some(unknown) = tags.iter().find(|t| session.roster().member(t).is_none()) {
        return Err(Error::NotFound(unknown.clone()));
    }

    let mut toggled = Vec::with_capacity(tags.len());
    for tag in tags {
        let result = session.toggle_tag(tag)?;
        toggled.push(ToggleEntry {
            tag: tag.clone(),
            result,
        });
    }

    Ok(ToggleResult {
        toggled,
        status: status(session),
    })
}

// === Solo ===

#[derive(Serialize)]
pub struct SoloResult {
    pub previous: Vec<String>,
    pub scope: Scope,
}

impl CommandResult for SoloResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.previous.is_empty() {
            "Already solo.".to_string()
        } else {
            format!("Unpaired {} ({} config cleared).", self.previous.join(", "), self.scope)
        }
    }
}

/// Deselect everyone and clear the stored identity.
pub fn solo<S: IdentityStore>(session: &PairSession<S>) -> Result<SoloResult> {
    let previous = session.selection().into_iter().map(|p| p.tag).collect();
    session.clear()?;
    Ok(SoloResult {
        previous,
        scope: session.scope(),
    })
}

// === Check ===

#[derive(Serialize)]
pub struct CheckResult {
    pub roster: PathBuf,
    pub members: usize,
    pub prefix: String,
    pub domain: String,
    pub global: bool,
    pub discarded: Vec<Discard>,
}

impl CheckResult {
    /// Whether every roster entry was usable.
    pub fn is_clean(&self) -> bool {
        self.discarded.is_empty()
    }
}

impl CommandResult for CheckResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{}: {} member{}",
            self.roster.display(),
            self.members,
            if self.members == 1 { "" } else { "s" }
        )];
        if self.is_clean() {
            lines.push("No problems found.".to_string());
        } else {
            for discard in &self.discarded {
                let tag = discard.tag.as_deref().unwrap_or("(unnamed)");
                lines.push(format!("  skipped {}: {}", tag, discard.reason));
            }
        }
        lines.join("\n")
    }
}

/// Load the roster and report every entry that had to be dropped.
pub fn check(repo_path: &Path, config: &ResolvedConfig) -> Result<CheckResult> {
    let (roster, discarded) = load_roster(repo_path, config)?;
    Ok(CheckResult {
        roster: roster_path(repo_path, config),
        members: roster.participants.len(),
        prefix: roster.prefix,
        domain: roster.domain,
        global: roster.use_shared_store,
        discarded,
    })
}

// === Config ===

#[derive(Serialize)]
pub struct SettingEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigShowResult {
    pub config_file: Option<PathBuf>,
    pub settings: Vec<SettingEntry>,
}

impl CommandResult for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![match self.config_file {
            Some(ref path) => format!("Config file: {}", path.display()),
            None => "Config file: (no config directory)".to_string(),
        }];
        for setting in &self.settings {
            lines.push(format!(
                "  {:<15} {:<12} ({})",
                setting.key, setting.value, setting.source
            ));
        }
        lines.join("\n")
    }
}

/// Resolved settings and where each one came from.
pub fn config_show(config: &ResolvedConfig) -> ConfigShowResult {
    let settings = vec![
        SettingEntry {
            key: "output-format",
            value: config.output_format.value.to_string(),
            source: config.output_format.source.to_string(),
        },
        SettingEntry {
            key: "roster-file",
            value: config.roster_file.value.clone(),
            source: config.roster_file.source.to_string(),
        },
        SettingEntry {
            key: "git-timeout-ms",
            value: config.git_timeout_ms.value.to_string(),
            source: config.git_timeout_ms.source.to_string(),
        },
        SettingEntry {
            key: "fallback-label",
            value: config.fallback_label.value.clone(),
            source: config.fallback_label.source.to_string(),
        },
    ];
    ConfigShowResult {
        config_file: system_config_path(),
        settings,
    }
}
