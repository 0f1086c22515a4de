//! Hashing helpers shared by the modules.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, Selector, B256, U256};
use alloy_sol_types::SolValue;

/// Operation hash = keccak256(abi.encode(account, chainId, operator, value, callData)).
///
/// `callData` is encoded as dynamic `bytes`, never packed.
pub fn operation_hash(
    account: Address,
    chain_id: u64,
    operator: Address,
    value: U256,
    call_data: &[u8],
) -> B256 {
    let encoded = (
        account,
        U256::from(chain_id),
        operator,
        value,
        Bytes::copy_from_slice(call_data),
    )
        .abi_encode_params();
    keccak256(encoded)
}

/// 4-byte function selector of a canonical Solidity signature.
pub fn selector(signature: &str) -> Selector {
    let h = keccak256(signature.as_bytes());
    FixedBytes([h[0], h[1], h[2], h[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegate_guard_types::{ActionKind, EXECUTE_SELECTOR};

    #[test]
    fn selector_constants_match_signatures() {
        for kind in [ActionKind::Approval, ActionKind::Supply, ActionKind::Swap] {
            assert_eq!(selector(kind.signature()), kind.selector(), "{kind}");
        }
        assert_eq!(selector("execute(bytes32,bytes)"), EXECUTE_SELECTOR);
    }

    #[test]
    fn operation_hash_binds_every_input() {
        let account = Address::repeat_byte(0x11);
        let operator = Address::repeat_byte(0x22);
        let base = operation_hash(account, 1, operator, U256::ZERO, &[1, 2, 3]);

        assert_ne!(base, operation_hash(Address::repeat_byte(0x12), 1, operator, U256::ZERO, &[1, 2, 3]));
        assert_ne!(base, operation_hash(account, 2, operator, U256::ZERO, &[1, 2, 3]));
        assert_ne!(base, operation_hash(account, 1, Address::repeat_byte(0x23), U256::ZERO, &[1, 2, 3]));
        assert_ne!(base, operation_hash(account, 1, operator, U256::from(1u64), &[1, 2, 3]));
        assert_ne!(base, operation_hash(account, 1, operator, U256::ZERO, &[1, 2, 3, 0]));
    }
}
