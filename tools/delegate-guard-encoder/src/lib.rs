//! Off-chain encoders for the delegate guard modules.
//!
//! Builds the exact bytes the modules decode (account `execute` calldata, policy action
//! calldata, install data) and mirrors the on-chain operation hash, plus a [`MockHost`] for
//! simulations and tests.

pub mod encoder;
pub mod host;
pub mod types;


pub use host::MockHost;
pub use types::SwapParams;
