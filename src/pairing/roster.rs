//! Team roster loaded from a parsed `.pairs` file.
//!
//! Two roster conventions are understood and may be mixed in one file:
//!
//! ```text
//! pairs:
//!   gc: Grumpy Cat; grumpy.cat      # inline name and email
//!   rw: Robert A. Wallis            # name only...
//! email_addresses:
//!   rw: smilingrob@gmail.com        # ...email looked up by tag
//! ```
//!
//! Entries that cannot become a participant are dropped. Every drop is
//! recorded as a [`Discard`] so callers that care can report them.

use super::member::Participant;
use crate::yaml::{self, Node};
use serde::Serialize;
use std::fmt;

/// One `pairs` entry, classified by the number of `;` separated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterEntry {
    /// `tag: Name; email`
    Inline { name: String, email: String },
    /// `tag: Name`, email expected in `email_addresses`
    NameOnly { name: String },
}

impl RosterEntry {
    /// Classify the value of a `pairs` child.
    pub fn parse(value: &str) -> Result<Self, DiscardReason> {
        let fields: Vec<&str> = value.split(';').map(str::trim).collect();
        match fields.as_slice() {
            [name] if name.is_empty() => Err(DiscardReason::MissingName),
            [name] => Ok(Self::NameOnly {
                name: name.to_string(),
            }),
            [name, ..] if name.is_empty() => Err(DiscardReason::MissingName),
            [_, email, ..] if email.is_empty() => Err(DiscardReason::MissingEmail),
            [name, email, ..] => Ok(Self::Inline {
                name: name.to_string(),
                email: email.to_string(),
            }),
            [] => Err(DiscardReason::MissingName),
        }
    }

    fn into_participant(self, tag: &str) -> Participant {
        match self {
            Self::Inline { name, email } => Participant::new(tag, Some(name), Some(email)),
            Self::NameOnly { name } => Participant::new(tag, Some(name), None),
        }
    }
}

/// Why a roster entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The node had no key to use as a tag.
    MissingTag,
    /// The node had no value at all.
    MissingValue,
    /// The name field was empty.
    MissingName,
    /// The email field was present but empty.
    MissingEmail,
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingTag => "missing tag",
            Self::MissingValue => "missing value",
            Self::MissingName => "missing name",
            Self::MissingEmail => "missing email after ';'",
        };
        f.write_str(text)
    }
}

/// A dropped roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub reason: DiscardReason,
}

/// Everyone who can pair, plus the rules for building a combined email.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterConfig {
    /// Prepended to the combined email local part, e.g. a team alias.
    pub prefix: String,

    /// Domain of the combined email. Empty means "borrow one from a member".
    pub domain: String,

    /// Participants in file order.
    pub participants: Vec<Participant>,

    /// Write the identity to the global git config instead of the repository's.
    pub use_shared_store: bool,
}

impl RosterConfig {
    /// Create an empty roster with the given email rules.
    pub fn new(prefix: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Parse `.pairs` text.
    pub fn parse(source: &str) -> Self {
        Self::from_node(&yaml::parse(source))
    }

    /// Build from an already parsed tree, dropping invalid entries.
    pub fn from_node(root: &Node) -> Self {
        load_with_diagnostics(root).0
    }

    /// Find a participant by tag.
    pub fn member(&self, tag: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.tag == tag)
    }

    /// Add a participant at the end of the roster.
    pub fn with_participant(mut self, participant: Participant) -> Self {
        self.participants.push(participant);
        self
    }
}

/// Build a roster and report every entry that was dropped.
pub fn load_with_diagnostics(root: &Node) -> (RosterConfig, Vec<Discard>) {
    let mut config = RosterConfig::default();
    let mut discards = Vec::new();

    if let Some(email) = root.get("email") {
        config.prefix = child_value(email, "prefix");
        config.domain = child_value(email, "domain");
    }

    config.use_shared_store = root
        .get("global")
        .and_then(Node::value)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    let Some(pairs) = root.get("pairs") else {
        return (config, discards);
    };

    for node in pairs.children() {
        match participant_from_node(node) {
            Ok(participant) => config.participants.push(participant),
            Err(reason) => {
                tracing::debug!(tag = ?node.key(), %reason, "dropping roster entry");
                discards.push(Discard {
                    tag: node.key().map(str::to_string),
                    reason,
                });
            }
        }
    }

    if let Some(addresses) = root.get("email_addresses") {
        for participant in &mut config.participants {
            apply_email_address(participant, addresses);
        }
    }

    (config, discards)
}

/// Turn one child of `pairs` into a participant.
pub fn participant_from_node(node: &Node) -> Result<Participant, DiscardReason> {
    let tag = node.key().ok_or(DiscardReason::MissingTag)?;
    let value = node.value().ok_or(DiscardReason::MissingValue)?;
    Ok(RosterEntry::parse(value)?.into_participant(tag))
}

/// Overwrite the participant's email from the `email_addresses` section when
/// it has a non-empty entry for the participant's tag.
pub fn apply_email_address(participant: &mut Participant, addresses: &Node) {
    if participant.tag.is_empty() {
        return;
    }
    let email = addresses
        .get(&participant.tag)
        .and_then(Node::value)
        .map(str::trim)
        .filter(|email| !email.is_empty());
    if let Some(email) = email {
        participant.email = Some(email.to_string());
    }
}

fn child_value(node: &Node, key: &str) -> String {
    node.get(key)
        .and_then(Node::value)
        .unwrap_or_default()
        .to_string()
}
