//! Shared utilities for the guard modules.
//!
//! These helpers are small and deterministic: ABI word readers and hashing.

pub mod bytes;
pub mod hashing;
