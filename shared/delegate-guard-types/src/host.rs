use alloy_primitives::Address;

/// Host environment abstraction, implemented differently on-chain vs off-chain.
///
/// The modules never read a clock, a network id or an owner list directly; they ask the host.
pub trait Host {
    /// Current block timestamp in whole seconds.
    fn block_timestamp(&self) -> u64;

    /// Network identity folded into operation hashes for replay isolation.
    fn chain_id(&self) -> u64;

    /// Owner-membership oracle: is `identity` an owner of `account`?
    ///
    /// Defaults to `false` so a host without owner information grants no bypass.
    fn is_owner(&self, _account: Address, _identity: Address) -> bool {
        false
    }
}
