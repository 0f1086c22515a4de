//! ERC-7579 module compatibility shims.
//!
//! Keeps the guard modules ABI-aligned with what an ERC-7579 account expects while the
//! actual authorization logic lives elsewhere.

pub mod constants;
pub mod interfaces;
