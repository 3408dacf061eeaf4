//! Identity store trait and an in-memory implementation.
//!
//! The session never talks to git directly. It reads and writes the
//! combined identity through an [`IdentityStore`]:
//! - `GitConfigStore` (in `crate::git`) - `git config user.name/user.email`
//! - [`MemoryStore`] - kept in process, for embedding and tests

use super::codec::CombinedIdentity;
use crate::Result;
use serde::Serialize;
use std::sync::Mutex;

/// Where an identity is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The current repository only.
    #[default]
    Local,
    /// Every repository of the user.
    Global,
}

impl Scope {
    /// Scope for a roster's `global` setting.
    pub fn from_shared(use_shared_store: bool) -> Self {
        if use_shared_store {
            Self::Global
        } else {
            Self::Local
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Global => "global",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persistence for the combined identity.
pub trait IdentityStore: Send + Sync {
    /// The email currently configured, if any.
    fn identity(&self) -> Result<Option<String>>;

    /// Write the defined fields of `identity`. `None` fields are left untouched.
    fn set_identity(&self, identity: &CombinedIdentity, scope: Scope) -> Result<()>;

    /// Remove the configured name and email.
    fn clear_identity(&self, scope: Scope) -> Result<()>;
}

impl<S: IdentityStore + ?Sized> IdentityStore for &S {
    fn identity(&self) -> Result<Option<String>> {
        (**self).identity()
    }

    fn set_identity(&self, identity: &CombinedIdentity, scope: Scope) -> Result<()> {
        (**self).set_identity(identity, scope)
    }

    fn clear_identity(&self, scope: Scope) -> Result<()> {
        (**self).clear_identity(scope)
    }
}

#[derive(Debug, Default, Clone)]
struct ScopedIdentity {
    name: Option<String>,
    email: Option<String>,
}

/// Identity store held in memory, with git-like local-over-global lookup.
#[derive(Debug, Default)]
pub struct MemoryStore {
    local: Mutex<ScopedIdentity>,
    global: Mutex<ScopedIdentity>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an email already configured locally.
    pub fn with_email(email: impl Into<String>) -> Self {
        let store = Self::new();
        store.slot(Scope::Local).email = Some(email.into());
        store
    }

    /// Effective name (local first, then global).
    pub fn name(&self) -> Option<String> {
        self.slot(Scope::Local)
            .name
            .clone()
            .or_else(|| self.slot(Scope::Global).name.clone())
    }

    /// Email configured in exactly this scope.
    pub fn email_in(&self, scope: Scope) -> Option<String> {
        self.slot(scope).email.clone()
    }

    fn slot(&self, scope: Scope) -> std::sync::MutexGuard<'_, ScopedIdentity> {
        let slot = match scope {
            Scope::Local => &self.local,
            Scope::Global => &self.global,
        };
        slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IdentityStore for MemoryStore {
    fn identity(&self) -> Result<Option<String>> {
        Ok(self
            .email_in(Scope::Local)
            .or_else(|| self.email_in(Scope::Global)))
    }

    fn set_identity(&self, identity: &CombinedIdentity, scope: Scope) -> Result<()> {
        {
            let mut slot = self.slot(scope);
            if let Some(name) = &identity.name {
                slot.name = Some(name.clone());
            }
            if let Some(email) = &identity.email {
                slot.email = Some(email.clone());
            }
        }
        // a global write must not stay hidden behind a local override
        if scope == Scope::Global {
            let mut local = self.slot(Scope::Local);
            if identity.name.is_some() {
                local.name = None;
            }
            if identity.email.is_some() {
                local.email = None;
            }
        }
        Ok(())
    }

    fn clear_identity(&self, scope: Scope) -> Result<()> {
        let mut slot = self.slot(scope);
        slot.name = None;
        slot.email = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: Option<&str>, email: Option<&str>) -> CombinedIdentity {
        CombinedIdentity {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_scope_from_shared() {
        assert_eq!(Scope::from_shared(true), Scope::Global);
        assert_eq!(Scope::from_shared(false), Scope::Local);
        assert_eq!(Scope::Global.to_string(), "global");
    }

    #[test]
    fn test_memory_store_set_and_read() {
        let store = MemoryStore::new();
        assert_eq!(store.identity().unwrap(), None);

        store
            .set_identity(&identity(Some("Grumpy Cat"), Some("grumpy.cat")), Scope::Local)
            .unwrap();
        assert_eq!(store.identity().unwrap().as_deref(), Some("grumpy.cat"));
        assert_eq!(store.name().as_deref(), Some("Grumpy Cat"));
    }

    #[test]
    fn test_memory_store_partial_write_keeps_other_field() {
        let store = MemoryStore::new();
        store
            .set_identity(&identity(Some("Old"), Some("old")), Scope::Local)
            .unwrap();
        store
            .set_identity(&identity(None, Some("new")), Scope::Local)
            .unwrap();
        assert_eq!(store.name().as_deref(), Some("Old"));
        assert_eq!(store.identity().unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_memory_store_global_write_unsets_local() {
        let store = MemoryStore::with_email("setup@example.com");
        store
            .set_identity(&identity(Some("Global"), Some("global@example.com")), Scope::Global)
            .unwrap();
        assert_eq!(store.email_in(Scope::Local), None);
        assert_eq!(
            store.identity().unwrap().as_deref(),
            Some("global@example.com")
        );
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryStore::with_email("a@example.com");
        store.clear_identity(Scope::Local).unwrap();
        assert_eq!(store.identity().unwrap(), None);
    }
}
