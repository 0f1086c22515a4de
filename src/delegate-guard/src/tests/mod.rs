//! Scenario tests driving the modules through a [`MockHost`].

mod hooks;

use alloy_primitives::{Address, U256};
use delegate_guard_encoder::encoder::{encode_approve, encode_execute};

pub(crate) fn addr(b: u8) -> Address {
    Address::repeat_byte(b)
}

pub(crate) fn account() -> Address {
    addr(0xA1)
}

pub(crate) fn owner() -> Address {
    addr(0x0E)
}

pub(crate) fn operator() -> Address {
    addr(0x0B)
}

pub(crate) fn token() -> Address {
    addr(0x70)
}

pub(crate) fn spender() -> Address {
    addr(0x5B)
}

/// Account `execute` calldata approving `amount` of [`token`] to [`spender`].
pub(crate) fn approve_call(amount: u64) -> Vec<u8> {
    encode_execute(
        token(),
        U256::ZERO,
        &encode_approve(spender(), U256::from(amount)),
    )
}
