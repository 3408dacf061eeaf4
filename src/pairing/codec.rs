//! Combining participants into one git identity, and recovering them again.
//!
//! ```text
//! {gc, rw} + prefix "team" + domain "example.com"
//!   name:  "Grumpy Cat & Robert A. Wallis"
//!   email: "team+grumpy.cat+robert.wallis@example.com"
//! ```
//!
//! Output is ordered by display name so the same group always produces the
//! same identity, whichever order the participants were picked in.

use super::member::Participant;
use super::roster::RosterConfig;
use serde::Serialize;
use std::borrow::Borrow;
use std::cmp::Ordering;

/// The synthetic `user.name` / `user.email` for a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombinedIdentity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl CombinedIdentity {
    /// No pairing active.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Build the combined identity for a group of participants.
///
/// Name and email are computed from independent subsets: someone without an
/// email can still appear in the name and the other way around.
pub fn encode<P: Borrow<Participant>>(selected: &[P], config: &RosterConfig) -> CombinedIdentity {
    if selected.is_empty() {
        return CombinedIdentity::default();
    }

    CombinedIdentity {
        name: pair_name(selected),
        email: pair_email(selected, config),
    }
}

/// Human readable list of names: `A`, `A & B`, `A, B, and C`.
pub fn pair_name<P: Borrow<Participant>>(selected: &[P]) -> Option<String> {
    let named = sorted_by_name(selected, |p| p.display_name.is_some());
    let names: Vec<&str> = named
        .iter()
        .filter_map(|p| p.display_name.as_deref())
        .collect();

    match names.as_slice() {
        [] => None,
        [only] => Some(only.to_string()),
        [first, second] => Some(format!("{} & {}", first, second)),
        [init @ .., last] => Some(format!("{}, and {}", init.join(", "), last)),
    }
}

/// Combined email: `[prefix+]local+local[@domain]`.
///
/// The domain comes from the roster when set, otherwise from the first
/// participant (in name order) whose email carries one.
pub fn pair_email<P: Borrow<Participant>>(selected: &[P], config: &RosterConfig) -> Option<String> {
    let with_email = sorted_by_name(selected, |p| p.email.is_some());
    if with_email.is_empty() {
        return None;
    }

    let mut email = String::new();
    if !config.prefix.is_empty() {
        email.push_str(&config.prefix);
        email.push('+');
    }

    let locals: Vec<&str> = with_email
        .iter()
        .filter_map(|p| p.email_local_part())
        .collect();
    email.push_str(&locals.join("+"));

    let domain = if config.domain.is_empty() {
        with_email.iter().find_map(|p| p.email_domain())
    } else {
        Some(config.domain.as_str())
    };
    if let Some(domain) = domain {
        email.push('@');
        email.push_str(domain);
    }

    Some(email)
}

/// Find the roster participants named by a combined email.
///
/// Every `+` separated alias of the local part is compared against each
/// participant's email, and against the part before `@` of full addresses.
/// The domain of the combined email is not checked, so two participants with
/// the same user name at different domains both match. Results follow alias
/// order, then roster order, and may contain the same participant twice.
pub fn decode(email: Option<&str>, roster: &RosterConfig) -> Vec<Participant> {
    let Some(email) = email.filter(|e| !e.is_empty()) else {
        return Vec::new();
    };

    let local = email.split_once('@').map_or(email, |(local, _)| local);

    let mut matches = Vec::new();
    for alias in local.split('+').filter(|a| !a.is_empty()) {
        for participant in &roster.participants {
            if alias_matches(alias, participant) {
                matches.push(participant.clone());
            }
        }
    }
    matches
}

fn alias_matches(alias: &str, participant: &Participant) -> bool {
    let Some(email) = participant.email.as_deref() else {
        return false;
    };
    alias == email || email.split_once('@').is_some_and(|(local, _)| alias == local)
}

fn sorted_by_name<P, F>(selected: &[P], keep: F) -> Vec<&Participant>
where
    P: Borrow<Participant>,
    F: Fn(&Participant) -> bool,
{
    let mut kept: Vec<&Participant> = selected
        .iter()
        .map(|p| Borrow::<Participant>::borrow(p))
        .filter(|p| keep(p))
        .collect();
    kept.sort_by(|a, b| by_name(a, b));
    kept
}

/// Alphabetical by display name, participants without one last.
fn by_name(a: &Participant, b: &Participant) -> Ordering {
    match (&a.display_name, &b.display_name) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
