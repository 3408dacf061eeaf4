//! Who is pairing right now.
//!
//! A [`PairSession`] belongs to one repository. It learns the current pair
//! from the identity store when initialized (instead of trusting any state of
//! its own), and writes the recomputed identity back on every toggle.

use super::codec::{self, CombinedIdentity};
use super::member::Participant;
use super::roster::RosterConfig;
use super::store::{IdentityStore, Scope};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

/// Label shown when nobody is paired.
pub const DEFAULT_FALLBACK_LABEL: &str = "git pair";

/// Result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    /// The participant joined the pair.
    Paired,
    /// The participant left the pair.
    Unpaired,
    /// The participant has no email and cannot pair.
    Ignored,
}

/// Pairing state for one repository.
pub struct PairSession<S: IdentityStore> {
    roster: RosterConfig,
    store: S,
    selection: Mutex<Vec<Participant>>,
    fallback_label: String,
}

impl<S: IdentityStore> PairSession<S> {
    /// Create a session with nobody selected. Call [`PairSession::initialize`]
    /// to pick up the pair already configured in the store.
    pub fn new(roster: RosterConfig, store: S) -> Self {
        Self {
            roster,
            store,
            selection: Mutex::new(Vec::new()),
            fallback_label: DEFAULT_FALLBACK_LABEL.to_string(),
        }
    }

    /// Replace the label returned by [`PairSession::display_name`] when nobody is paired.
    pub fn with_fallback_label(mut self, label: impl Into<String>) -> Self {
        self.fallback_label = label.into();
        self
    }

    /// Read the configured email from the store and select whoever it names.
    ///
    /// A store that cannot be read counts as "nobody configured".
    pub fn initialize(&self) {
        let email = match self.store.identity() {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(error = %e, "could not read current identity");
                None
            }
        };

        let mut found = Vec::new();
        for participant in codec::decode(email.as_deref(), &self.roster) {
            if !found.contains(&participant) {
                found.push(participant);
            }
        }
        tracing::debug!(count = found.len(), "initialized pair selection");

        *self.lock() = found;
    }

    /// Add the participant to the pair, or remove them if already paired, and
    /// write the new identity to the store.
    ///
    /// Participants without an email are ignored. When the store write fails
    /// the selection is left as it was before the call.
    pub fn toggle(&self, participant: &Participant) -> Result<Toggle> {
        if !participant.has_email() {
            return Ok(Toggle::Ignored);
        }

        let mut selection = self.lock();
        let previous = selection.clone();

        let outcome = match selection.iter().position(|p| p == participant) {
            Some(index) => {
                selection.remove(index);
                Toggle::Unpaired
            }
            None => {
                selection.push(participant.clone());
                Toggle::Paired
            }
        };

        let identity = codec::encode(selection.as_slice(), &self.roster);
        let scope = self.scope();
        let written = if identity.is_empty() {
            self.store.clear_identity(scope)
        } else {
            self.store.set_identity(&identity, scope)
        };

        if let Err(e) = written {
            *selection = previous;
            return Err(e);
        }

        tracing::debug!(tag = %participant.tag, ?outcome, email = ?identity.email, "toggled");
        Ok(outcome)
    }

    /// Toggle the roster participant with this tag.
    pub fn toggle_tag(&self, tag: &str) -> Result<Toggle> {
        let participant = self
            .roster
            .member(tag)
            .cloned()
            .ok_or_else(|| Error::NotFound(tag.to_string()))?;
        self.toggle(&participant)
    }

    /// Deselect everyone and clear the stored identity.
    pub fn clear(&self) -> Result<()> {
        let mut selection = self.lock();
        self.store.clear_identity(self.scope())?;
        selection.clear();
        Ok(())
    }

    /// Combined name of the current pair, or the fallback label.
    pub fn display_name(&self) -> String {
        let selection = self.lock();
        if selection.is_empty() {
            return self.fallback_label.clone();
        }
        codec::pair_name(selection.as_slice()).unwrap_or_else(|| self.fallback_label.clone())
    }

    /// Whether the participant is part of the current pair.
    pub fn is_selected(&self, participant: &Participant) -> bool {
        self.lock().contains(participant)
    }

    /// Current pair, in the order participants were selected.
    pub fn selection(&self) -> Vec<Participant> {
        self.lock().clone()
    }

    /// Combined identity of the current pair.
    pub fn identity(&self) -> CombinedIdentity {
        codec::encode(self.lock().as_slice(), &self.roster)
    }

    pub fn roster(&self) -> &RosterConfig {
        &self.roster
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Scope identity writes go to.
    pub fn scope(&self) -> Scope {
        Scope::from_shared(self.roster.use_shared_store)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Participant>> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairing::store::MemoryStore;

    const ROSTER: &str = "pairs:\n  \
          gc: Grumpy Cat;grumpy.cat\n  \
          pp: Pinkie Pie; pinkie.pie\n  \
          rw: Robert A. Wallis; robert.wallis\n  \
          nm: No Mail\n\
        email:\n  \
          prefix: prefix\n  \
          domain: example.com\n";

    /// Store whose writes always fail.
    struct BrokenStore;

    impl IdentityStore for BrokenStore {
        fn identity(&self) -> Result<Option<String>> {
            Err(Error::Other("store offline".to_string()))
        }

        fn set_identity(&self, _identity: &CombinedIdentity, _scope: Scope) -> Result<()> {
            Err(Error::Other("store offline".to_string()))
        }

        fn clear_identity(&self, _scope: Scope) -> Result<()> {
            Err(Error::Other("store offline".to_string()))
        }
    }

    fn session(email: Option<&str>) -> PairSession<MemoryStore> {
        let store = email.map_or_else(MemoryStore::new, MemoryStore::with_email);
        let session = PairSession::new(RosterConfig::parse(ROSTER), store);
        session.initialize();
        session
    }

    fn member(session: &PairSession<MemoryStore>, tag: &str) -> Participant {
        session.roster().member(tag).cloned().unwrap()
    }

    #[test]
    fn test_initialize_from_store() {
        let session = session(Some("grumpy.cat+robert.wallis"));
        let tags: Vec<String> = session.selection().into_iter().map(|p| p.tag).collect();
        assert_eq!(tags, ["gc", "rw"]);
    }

    #[test]
    fn test_initialize_deduplicates() {
        let session = session(Some("robert.wallis+robert.wallis@example.com"));
        assert_eq!(session.selection().len(), 1);
    }

    #[test]
    fn test_toggle_member_off() {
        let session = session(Some("grumpy.cat+robert.wallis"));
        let gc = member(&session, "gc");

        assert_eq!(session.toggle(&gc).unwrap(), Toggle::Unpaired);
        assert_eq!(session.display_name(), "Robert A. Wallis");
        assert_eq!(
            session.store().identity().unwrap().as_deref(),
            Some("prefix+robert.wallis@example.com")
        );
    }

    #[test]
    fn test_toggle_member_on() {
        let session = session(Some("robert.wallis"));
        assert_eq!(session.toggle_tag("gc").unwrap(), Toggle::Paired);
        assert_eq!(session.display_name(), "Grumpy Cat & Robert A. Wallis");
        assert_eq!(
            session.store().name().as_deref(),
            Some("Grumpy Cat & Robert A. Wallis")
        );
        assert_eq!(
            session.store().identity().unwrap().as_deref(),
            Some("prefix+grumpy.cat+robert.wallis@example.com")
        );
    }

    #[test]
    fn test_toggle_twice_restores_identity() {
        let session = session(Some("prefix+grumpy.cat+robert.wallis@example.com"));
        let before = session.identity();
        let before_selection = session.selection();

        session.toggle_tag("pp").unwrap();
        assert_ne!(session.identity(), before);
        session.toggle_tag("pp").unwrap();

        assert_eq!(session.identity(), before);
        assert_eq!(session.selection(), before_selection);
        assert_eq!(session.store().identity().unwrap(), before.email);
    }

    #[test]
    fn test_toggle_last_member_clears_store() {
        let session = session(Some("robert.wallis"));
        session.toggle_tag("rw").unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.store().identity().unwrap(), None);
        assert_eq!(session.store().name(), None);
    }

    #[test]
    fn test_toggle_without_email_is_ignored() {
        let session = session(Some("robert.wallis"));
        assert_eq!(session.toggle_tag("nm").unwrap(), Toggle::Ignored);
        assert_eq!(session.display_name(), "Robert A. Wallis");
        assert_eq!(session.store().identity().unwrap().as_deref(), Some("robert.wallis"));
    }

    #[test]
    fn test_toggle_unknown_tag() {
        let session = session(None);
        assert!(matches!(session.toggle_tag("zz"), Err(Error::NotFound(tag)) if tag == "zz"));
    }

    #[test]
    fn test_no_member_title() {
        let session = session(Some("not.valid"));
        assert_eq!(session.display_name(), "git pair");

        let custom = PairSession::new(RosterConfig::parse(ROSTER), MemoryStore::new())
            .with_fallback_label("solo");
        custom.initialize();
        assert_eq!(custom.display_name(), "solo");
    }

    #[test]
    fn test_is_selected() {
        let session = session(Some("robert.wallis"));
        assert!(session.is_selected(&member(&session, "rw")));
        assert!(!session.is_selected(&member(&session, "gc")));
    }

    #[test]
    fn test_nameless_participant_writes_email_only() {
        let roster = RosterConfig::new("", "example.com");
        let store = MemoryStore::new();
        let session = PairSession::new(roster, &store);
        session.initialize();

        let ghost = Participant::new("gh", None, Some("ghost".to_string()));
        assert_eq!(session.toggle(&ghost).unwrap(), Toggle::Paired);

        assert_eq!(store.identity().unwrap().as_deref(), Some("ghost@example.com"));
        assert_eq!(store.name(), None);
        assert_eq!(session.display_name(), "git pair");
    }

    #[test]
    fn test_global_roster_writes_global_scope() {
        let roster = RosterConfig::parse(&format!("{}global: true\n", ROSTER));
        let store = MemoryStore::with_email("setup@example.com");
        let session = PairSession::new(roster, &store);
        session.initialize();

        session.toggle_tag("gc").unwrap();
        assert_eq!(session.scope(), Scope::Global);
        assert_eq!(
            store.email_in(Scope::Global).as_deref(),
            Some("prefix+grumpy.cat@example.com")
        );
        assert_eq!(store.email_in(Scope::Local), None);
    }

    #[test]
    fn test_store_failure_rolls_back() {
        let session = PairSession::new(RosterConfig::parse(ROSTER), BrokenStore);
        session.initialize();
        assert!(session.selection().is_empty());

        assert!(session.toggle_tag("gc").is_err());
        assert!(session.selection().is_empty());
        assert!(session.clear().is_err());
    }

    #[test]
    fn test_clear() {
        let session = session(Some("grumpy.cat+robert.wallis"));
        session.clear().unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.store().identity().unwrap(), None);
    }
}
