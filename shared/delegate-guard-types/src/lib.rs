//! Shared types for the delegate guard modules.
//!
//! Everything here sits on the boundary between the on-chain modules and off-chain tooling:
//! the host environment the modules consult, the policy action kinds with their selectors,
//! and the ERC-7579 execution-mode tag.

pub mod actions;
pub mod exec_mode;
pub mod host;

pub use actions::{ActionKind, APPROVE_SELECTOR, EXACT_INPUT_SINGLE_SELECTOR, SUPPLY_SELECTOR};
pub use exec_mode::{CallType, ExecMode, ExecType, EXECUTE_SELECTOR};
pub use host::Host;
