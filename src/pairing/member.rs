use serde::Serialize;
use std::hash::{Hash, Hasher};

/// A programmer who can take part in a pair.
///
/// Two participants are the same participant when their tags match, whatever
/// their name or email say.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    /// Short identifier from the roster, usually initials (e.g. "rw").
    pub tag: String,

    /// Human readable name used for the commit author (e.g. "Robert A. Wallis").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Email user name ("robert.wallis") or full address ("robert.wallis@example.com").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Participant {
    pub fn new(
        tag: impl Into<String>,
        display_name: Option<String>,
        email: Option<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            display_name,
            email,
        }
    }

    /// Whether this participant can contribute to a combined email.
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Text before the first `@` of the email, or the whole email.
    pub fn email_local_part(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(|email| email.split_once('@').map_or(email, |(local, _)| local))
    }

    /// Text after the first `@` of the email, if there is one.
    pub fn email_domain(&self) -> Option<&str> {
        self.email
            .as_deref()
            .and_then(|email| email.split_once('@'))
            .map(|(_, domain)| domain)
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Participant {}

impl Hash for Participant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}
