//! Protocol constants.

use alloy_primitives::U256;

// ERC-7579 module type IDs.
pub const MODULE_TYPE_HOOK: U256 = U256::from_limbs([4, 0, 0, 0]);
pub const MODULE_TYPE_POLICY: U256 = U256::from_limbs([5, 0, 0, 0]);

// Policy return codes (non-zero validation data is failure).
pub const POLICY_SUCCESS_UINT: U256 = U256::ZERO;
pub const POLICY_FAILED_UINT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Active cooldowns must be strictly greater than this, in seconds.
pub const MIN_COOLDOWN: u64 = 60;

/// Cooldown and expiration are packed as `uint48`.
pub const MAX_UINT48: u64 = (1 << 48) - 1;

/// Upper bound on hooks composed for one account.
pub const MAX_HOOKS: usize = 16;

pub const SECONDS_PER_DAY: u64 = 86_400;
