//! Authorization layer for delegated-execution accounts.
//!
//! An account's owner keeps full control while operators trigger pre-approved calls:
//!
//! - [`timelock::TimelockHook`] makes operator calls wait out a cooldown, then execute once
//!   within an expiration window; owners and immediate selectors bypass it.
//! - [`policy::ActionPolicy`] checks the decoded parameters of approvals, lending supplies and
//!   swaps against allow-lists and per-call / daily caps.
//! - [`hooks::MultiHook`] runs several hooks as one, fanning `pre_check` out in order and
//!   `post_check` back in reverse.
//!
//! State is partitioned by account. The chain clock, the network id and the owner oracle are
//! supplied by a [`Host`].

pub mod decoder;
pub mod errors;
pub mod events;
pub mod hooks;
pub mod ledger;
pub mod module;
pub mod policy;
pub mod timelock;
pub mod utils;

#[cfg(test)]
mod tests;

pub use delegate_guard_types::{ActionKind, Host};
pub use errors::{DecodeError, GuardError, Result};
pub use events::GuardEvent;
pub use hooks::{Hook, HookResolver, MultiHook};
pub use ledger::UsageWindow;
pub use policy::{ActionPolicy, PolicyConfig};
pub use timelock::{OperationState, QueueEntry, TimelockConfig, TimelockHook, TimelockHookData};
