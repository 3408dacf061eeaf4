//! Pairing logic.
//!
//! - `member` - [`Participant`], one person who can pair
//! - `roster` - [`RosterConfig`], everyone in the `.pairs` file
//! - `codec` - combined identity encoding and decoding
//! - `store` - [`IdentityStore`], where the combined identity lives
//! - `session` - [`PairSession`], the current pair and toggling

pub mod codec;
mod member;
pub mod roster;
pub mod session;
pub mod store;

pub use codec::{CombinedIdentity, decode, encode};
pub use member::Participant;
pub use roster::{Discard, DiscardReason, RosterConfig, RosterEntry, load_with_diagnostics};
pub use session::{DEFAULT_FALLBACK_LABEL, PairSession, Toggle};
pub use store::{IdentityStore, MemoryStore, Scope};
