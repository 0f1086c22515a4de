//! Calldata decoding for the account's `execute` entrypoint and for policy actions.
//!
//! Every layout is fixed and decoded positionally. Wrong selectors, short input, dirty padding
//! and trailing bytes are all errors; nothing defaults.

use alloy_primitives::{Address, Bytes, FixedBytes, Selector, U256};
use alloy_sol_types::SolCall;
use delegate_guard_types::{ActionKind, ExecMode, EXECUTE_SELECTOR};

use crate::{
    errors::{DecodeError, GuardError, Result},
    module::interfaces::IERC7579Execution::executeCall,
    utils::bytes::{expect_end, read_address, read_selector, read_u256, read_uint, WORD},
};

/// `selector || mode || offset || length` of `execute(bytes32,bytes)`.
pub const MIN_EXECUTE_LEN: usize = 4 + WORD * 3;

/// `target (20) || value (32) || selector (4)` of a packed single execution.
pub const MIN_SINGLE_EXECUTION_LEN: usize = 20 + WORD + 4;

/// A decoded ERC-7579 single-call execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SingleExecution {
    pub target: Address,
    pub value: U256,
    pub call_data: Bytes,
}

impl SingleExecution {
    /// Selector of the inner call (guaranteed present by decoding).
    pub fn selector(&self) -> Selector {
        FixedBytes([
            self.call_data[0],
            self.call_data[1],
            self.call_data[2],
            self.call_data[3],
        ])
    }
}

/// Decode `execute(bytes32 mode, bytes executionCalldata)` in single-call mode.
pub fn decode_execution(msg_data: &[u8]) -> Result<SingleExecution> {
    if msg_data.len() < MIN_EXECUTE_LEN {
        return Err(DecodeError::Truncated.into());
    }
    let mut i = 0usize;
    let selector = read_selector(msg_data, &mut i)?;
    if selector != EXECUTE_SELECTOR {
        return Err(GuardError::UnsupportedSelector { selector });
    }

    let call = executeCall::abi_decode(msg_data, true).map_err(|_| DecodeError::Abi)?;
    let mode = ExecMode::from(call.mode);
    if !mode.is_single() {
        tracing::debug!(call_type = ?mode.call_type(), "unsupported execution mode");
        return Err(GuardError::UnsupportedExecutionMode { mode: call.mode });
    }

    let packed = call.executionCalldata;
    if packed.len() < MIN_SINGLE_EXECUTION_LEN {
        return Err(DecodeError::Truncated.into());
    }
    Ok(SingleExecution {
        target: Address::from_slice(&packed[..20]),
        value: U256::from_be_slice(&packed[20..20 + WORD]),
        call_data: Bytes::copy_from_slice(&packed[20 + WORD..]),
    })
}

/// `approve(address spender, uint256 amount)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApproveCall {
    pub spender: Address,
    pub amount: U256,
}

/// `supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyCall {
    pub asset: Address,
    pub amount: U256,
    pub on_behalf_of: Address,
    pub referral_code: u16,
}

/// `exactInputSingle(ExactInputSingleParams)`; the params tuple is static, so it is inlined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapCall {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: U256,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
    pub sqrt_price_limit_x96: U256,
}

/// A decoded policy action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionCall {
    Approve(ApproveCall),
    Supply(SupplyCall),
    Swap(SwapCall),
}

impl ActionCall {
    /// Counterpart addresses checked against the policy allow-list, in check order.
    pub fn counterparts(&self) -> Vec<Address> {
        match self {
            ActionCall::Approve(c) => vec![c.spender],
            ActionCall::Supply(c) => vec![c.asset],
            ActionCall::Swap(c) => vec![c.token_in, c.token_out],
        }
    }

    /// Recipient of the action's proceeds, when the action has one.
    pub fn beneficiary(&self) -> Option<Address> {
        match self {
            ActionCall::Approve(_) => None,
            ActionCall::Supply(c) => Some(c.on_behalf_of),
            ActionCall::Swap(c) => Some(c.recipient),
        }
    }

    /// Token amount metered against the per-call maximum and the daily cap.
    pub fn amount(&self) -> U256 {
        match self {
            ActionCall::Approve(c) => c.amount,
            ActionCall::Supply(c) => c.amount,
            ActionCall::Swap(c) => c.amount_in,
        }
    }

    pub fn deadline(&self) -> Option<U256> {
        match self {
            ActionCall::Swap(c) => Some(c.deadline),
            _ => None,
        }
    }
}

/// Decode `call_data` as the one action `kind` recognises.
pub fn decode_action(kind: ActionKind, call_data: &[u8]) -> Result<ActionCall> {
    let mut i = 0usize;
    let selector = read_selector(call_data, &mut i)?;
    if selector != kind.selector() {
        return Err(GuardError::UnsupportedSelector { selector });
    }

    let call = match kind {
        ActionKind::Approval => {
            let spender = read_address(call_data, &mut i)?;
            let amount = read_u256(call_data, &mut i)?;
            ActionCall::Approve(ApproveCall { spender, amount })
        }
        ActionKind::Supply => {
            let asset = read_address(call_data, &mut i)?;
            let amount = read_u256(call_data, &mut i)?;
            let on_behalf_of = read_address(call_data, &mut i)?;
            let referral_code = read_uint(call_data, &mut i, 16)?.to::<u16>();
            ActionCall::Supply(SupplyCall {
                asset,
                amount,
                on_behalf_of,
                referral_code,
            })
        }
        ActionKind::Swap => {
            let token_in = read_address(call_data, &mut i)?;
            let token_out = read_address(call_data, &mut i)?;
            let fee = read_uint(call_data, &mut i, 24)?.to::<u32>();
            let recipient = read_address(call_data, &mut i)?;
            let deadline = read_u256(call_data, &mut i)?;
            let amount_in = read_u256(call_data, &mut i)?;
            let amount_out_minimum = read_u256(call_data, &mut i)?;
            let sqrt_price_limit_x96 = read_uint(call_data, &mut i, 160)?;
            ActionCall::Swap(SwapCall {
                token_in,
                token_out,
                fee,
                recipient,
                deadline,
                amount_in,
                amount_out_minimum,
                sqrt_price_limit_x96,
            })
        }
    };

    expect_end(call_data, i)?;
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use delegate_guard_encoder::{
        encoder::{encode_approve, encode_execute, encode_execute_with_mode, encode_swap},
        SwapParams,
    };
    use delegate_guard_types::{CallType, ExecType};

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn decodes_single_execution() {
        let inner = encode_approve(addr(2), U256::from(5u64));
        let msg = encode_execute(addr(1), U256::from(7u64), &inner);
        let exec = decode_execution(&msg).unwrap();
        assert_eq!(exec.target, addr(1));
        assert_eq!(exec.value, U256::from(7u64));
        assert_eq!(exec.call_data.as_ref(), inner.as_slice());
        assert_eq!(exec.selector(), ActionKind::Approval.selector());
    }

    #[test]
    fn rejects_batch_mode() {
        let inner = encode_approve(addr(2), U256::from(5u64));
        let mode = ExecMode::new(CallType::Batch, ExecType::Default);
        let msg = encode_execute_with_mode(mode, addr(1), U256::ZERO, &inner);
        assert_eq!(
            decode_execution(&msg),
            Err(GuardError::UnsupportedExecutionMode { mode: mode.0 })
        );
    }

    #[test]
    fn rejects_short_and_foreign_input() {
        assert_eq!(
            decode_execution(&[0xe9, 0xae, 0x5c]),
            Err(GuardError::MalformedCallData(DecodeError::Truncated))
        );

        let mut msg = encode_execute(addr(1), U256::ZERO, &[0xde, 0xad, 0xbe, 0xef]);
        msg[0] = 0x00;
        assert!(matches!(
            decode_execution(&msg),
            Err(GuardError::UnsupportedSelector { .. })
        ));
    }

    #[test]
    fn rejects_inner_call_without_selector() {
        let msg = encode_execute(addr(1), U256::ZERO, &[0xde, 0xad]);
        assert_eq!(
            decode_execution(&msg),
            Err(GuardError::MalformedCallData(DecodeError::Truncated))
        );
    }

    #[test]
    fn action_selector_must_match_kind() {
        let data = encode_approve(addr(2), U256::from(1u64));
        assert_eq!(
            decode_action(ActionKind::Swap, &data),
            Err(GuardError::UnsupportedSelector {
                selector: ActionKind::Approval.selector()
            })
        );
    }

    #[test]
    fn action_trailing_bytes_are_rejected() {
        let mut data = encode_approve(addr(2), U256::from(1u64));
        data.push(0);
        assert!(matches!(
            decode_action(ActionKind::Approval, &data),
            Err(GuardError::MalformedCallData(DecodeError::TrailingBytes { .. }))
        ));
    }

    #[test]
    fn swap_fee_wider_than_uint24_is_rejected() {
        let mut data = encode_swap(&SwapParams {
            token_in: addr(3),
            token_out: addr(4),
            fee: 3000,
            recipient: addr(1),
            deadline: U256::MAX,
            amount_in: U256::from(10u64),
            amount_out_minimum: U256::ZERO,
            sqrt_price_limit_x96: U256::ZERO,
        });
        // fee word starts after selector + two address words; set a bit above 24.
        data[4 + 64 + 28] = 0x01;
        assert_eq!(
            decode_action(ActionKind::Swap, &data),
            Err(GuardError::MalformedCallData(DecodeError::OutOfRange { bits: 24 }))
        );
    }
}
