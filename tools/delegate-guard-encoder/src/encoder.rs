use alloy_primitives::{Address, FixedBytes, U256};
use delegate_guard_types::{ActionKind, ExecMode, EXECUTE_SELECTOR};
use sha3::{Digest, Keccak256};

use crate::types::SwapParams;

fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(&out);
    FixedBytes(b)
}

fn address_word(addr: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(addr.as_slice());
    word
}

fn u64_word(value: u64) -> [u8; 32] {
    U256::from(value).to_be_bytes::<32>()
}

/// Append `bytes` as ABI dynamic `bytes` tail: length word, then data right-padded to 32.
fn push_dynamic(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&u64_word(bytes.len() as u64));
    buf.extend_from_slice(bytes);
    let pad = (32 - bytes.len() % 32) % 32;
    buf.extend(std::iter::repeat(0u8).take(pad));
}

/// 4-byte selector of a canonical Solidity signature.
pub fn selector(signature: &str) -> FixedBytes<4> {
    let h = keccak256_bytes(signature.as_bytes());
    FixedBytes([h[0], h[1], h[2], h[3]])
}

/// ERC-7579 `execute(bytes32 mode, bytes executionCalldata)` in single-call mode.
pub fn encode_execute(target: Address, value: U256, inner: &[u8]) -> Vec<u8> {
    encode_execute_with_mode(ExecMode::SINGLE, target, value, inner)
}

/// `execute` with an arbitrary mode word; the payload is always packed as a single call.
pub fn encode_execute_with_mode(mode: ExecMode, target: Address, value: U256, inner: &[u8]) -> Vec<u8> {
    // executionCalldata = target (20) || value (32) || inner
    let mut packed = Vec::with_capacity(20 + 32 + inner.len());
    packed.extend_from_slice(target.as_slice());
    packed.extend_from_slice(&value.to_be_bytes::<32>());
    packed.extend_from_slice(inner);

    let mut buf = Vec::with_capacity(4 + 32 * 3 + packed.len() + 32);
    buf.extend_from_slice(EXECUTE_SELECTOR.as_slice());
    buf.extend_from_slice(mode.0.as_slice());
    // offset of the dynamic `bytes` argument
    buf.extend_from_slice(&u64_word(0x40));
    push_dynamic(&mut buf, &packed);
    buf
}

/// `approve(address spender, uint256 amount)`.
pub fn encode_approve(spender: Address, amount: U256) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 32 * 2);
    buf.extend_from_slice(ActionKind::Approval.selector().as_slice());
    buf.extend_from_slice(&address_word(spender));
    buf.extend_from_slice(&amount.to_be_bytes::<32>());
    buf
}

/// `supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode)`.
pub fn encode_supply(asset: Address, amount: U256, on_behalf_of: Address, referral_code: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 32 * 4);
    buf.extend_from_slice(ActionKind::Supply.selector().as_slice());
    buf.extend_from_slice(&address_word(asset));
    buf.extend_from_slice(&amount.to_be_bytes::<32>());
    buf.extend_from_slice(&address_word(on_behalf_of));
    buf.extend_from_slice(&u64_word(u64::from(referral_code)));
    buf
}

/// `exactInputSingle(ExactInputSingleParams)`; a static tuple, so encoded inline.
pub fn encode_swap(params: &SwapParams) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + 32 * 8);
    buf.extend_from_slice(ActionKind::Swap.selector().as_slice());
    buf.extend_from_slice(&address_word(params.token_in));
    buf.extend_from_slice(&address_word(params.token_out));
    buf.extend_from_slice(&u64_word(u64::from(params.fee)));
    buf.extend_from_slice(&address_word(params.recipient));
    buf.extend_from_slice(&params.deadline.to_be_bytes::<32>());
    buf.extend_from_slice(&params.amount_in.to_be_bytes::<32>());
    buf.extend_from_slice(&params.amount_out_minimum.to_be_bytes::<32>());
    buf.extend_from_slice(&params.sqrt_price_limit_x96.to_be_bytes::<32>());
    buf
}

/// Timelock install data: `abi.encode(uint48 cooldown, uint48 expiration)`.
///
/// Values are written as given; the module rejects anything above the `uint48` bound.
pub fn encode_timelock_install(cooldown: u64, expiration: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(&u64_word(cooldown));
    buf.extend_from_slice(&u64_word(expiration));
    buf
}

/// Policy install data:
/// `abi.encode(address[] allowedTargets, address[] allowedCounterparts, uint256 maxPerCall, uint256 dailyCap)`.
pub fn encode_policy_install(
    targets: &[Address],
    counterparts: &[Address],
    max_per_call: U256,
    daily_cap: U256,
) -> Vec<u8> {
    let head_len = 32 * 4;
    let targets_offset = head_len;
    let counterparts_offset = targets_offset + 32 * (1 + targets.len());

    let mut buf = Vec::new();
    buf.extend_from_slice(&u64_word(targets_offset as u64));
    buf.extend_from_slice(&u64_word(counterparts_offset as u64));
    buf.extend_from_slice(&max_per_call.to_be_bytes::<32>());
    buf.extend_from_slice(&daily_cap.to_be_bytes::<32>());

    for list in [targets, counterparts] {
        buf.extend_from_slice(&u64_word(list.len() as u64));
        for addr in list {
            buf.extend_from_slice(&address_word(*addr));
        }
    }
    buf
}

/// Operation hash (must match the on-chain `operation_hash`):
/// `keccak256(abi.encode(account, chainId, operator, value, callData))`.
pub fn operation_hash(
    account: Address,
    chain_id: u64,
    operator: Address,
    value: U256,
    call_data: &[u8],
) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(32 * 6 + call_data.len() + 32);
    buf.extend_from_slice(&address_word(account));
    buf.extend_from_slice(&u64_word(chain_id));
    buf.extend_from_slice(&address_word(operator));
    buf.extend_from_slice(&value.to_be_bytes::<32>());
    // offset of the dynamic `bytes` argument: five head words
    buf.extend_from_slice(&u64_word(32 * 5));
    push_dynamic(&mut buf, call_data);
    keccak256_bytes(&buf)
}
