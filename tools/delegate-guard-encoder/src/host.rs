//! Mock host for off-chain simulation and testing.

use std::collections::BTreeSet;

use alloy_primitives::Address;

pub use delegate_guard_types::Host;

/// Start time of a fresh [`MockHost`]. Non-zero, since a zero queue timestamp means "absent".
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Mock host with a warpable clock, a settable network id and an in-memory owner set.
#[derive(Clone, Debug)]
pub struct MockHost {
    pub block_timestamp: u64,
    pub chain_id: u64,
    owners: BTreeSet<(Address, Address)>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new(GENESIS_TIMESTAMP, 1)
    }
}

impl MockHost {
    pub fn new(block_timestamp: u64, chain_id: u64) -> Self {
        Self {
            block_timestamp,
            chain_id,
            owners: BTreeSet::new(),
        }
    }

    pub fn with_owner(mut self, account: Address, owner: Address) -> Self {
        self.add_owner(account, owner);
        self
    }

    pub fn add_owner(&mut self, account: Address, owner: Address) {
        self.owners.insert((account, owner));
    }

    pub fn remove_owner(&mut self, account: Address, owner: Address) {
        self.owners.remove(&(account, owner));
    }

    /// Move the clock forward by `seconds`.
    pub fn warp(&mut self, seconds: u64) {
        self.block_timestamp = self.block_timestamp.saturating_add(seconds);
    }
}

impl Host for MockHost {
    fn block_timestamp(&self) -> u64 {
        self.block_timestamp
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn is_owner(&self, account: Address, identity: Address) -> bool {
        self.owners.contains(&(account, identity))
    }
}
