//! Error types.
//!
//! All failures are fail-closed and carry the offending value together with the threshold or
//! required value, so callers can react programmatically. [`GuardError::revert_data`] gives
//! the same detail as Solidity custom-error revert data.

use alloy_primitives::{Address, Selector, B256, U256};
use alloy_sol_types::SolError;
use thiserror::Error;

/// Errors during calldata decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("calldata truncated")]
    Truncated,
    #[error("address word has non-zero padding")]
    DirtyAddress,
    #[error("word does not fit in uint{bits}")]
    OutOfRange { bits: usize },
    #[error("expected {expected} bytes of calldata, got {actual}")]
    TrailingBytes { expected: usize, actual: usize },
    #[error("ABI decoding failed")]
    Abi,
}

/// Central error enum for guard operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    // Access control
    #[error("caller {caller} is not the account {account}")]
    NotAccount { caller: Address, account: Address },

    #[error("{initiator} is not an owner of {account}")]
    NotOwner { account: Address, initiator: Address },

    #[error("caller {caller} is neither account {account} nor operator {operator}")]
    NotAccountOrOperator {
        caller: Address,
        account: Address,
        operator: Address,
    },

    // Lifecycle
    #[error("{account} is not initialized")]
    NotInitialized { account: Address },

    #[error("{account} is already initialized")]
    AlreadyInitialized { account: Address },

    #[error("timelock is not activated for {account}")]
    NotActivated { account: Address },

    #[error("timelock is already activated for {account}")]
    AlreadyActivated { account: Address },

    // Validation
    #[error("target {target} is not allow-listed")]
    TargetNotAllowed { target: Address },

    #[error("counterpart {counterpart} is not allow-listed")]
    CounterpartNotAllowed { counterpart: Address },

    #[error("beneficiary {supplied} does not match required {required}")]
    BeneficiaryMismatch { supplied: Address, required: Address },

    #[error("unsupported execution mode {mode}")]
    UnsupportedExecutionMode { mode: B256 },

    #[error("unsupported selector {selector}")]
    UnsupportedSelector { selector: Selector },

    #[error("malformed calldata: {0}")]
    MalformedCallData(#[from] DecodeError),

    #[error("native value {value} is not allowed")]
    EthValueForbidden { value: U256 },

    #[error("deadline {deadline} already passed at {now}")]
    DeadlineExpired { deadline: u64, now: u64 },

    #[error("malformed hook data")]
    InvalidHookData,

    // Limits
    #[error("amount {amount} exceeds per-call maximum {max}")]
    PerCallLimitExceeded { amount: U256, max: U256 },

    #[error("daily total {attempted} exceeds cap {cap}")]
    DailyCapExceeded { attempted: U256, cap: U256 },

    #[error("value {value} exceeds bound {bound}")]
    ValueExceedsBound { value: U256, bound: u64 },

    #[error("cooldown {cooldown} must exceed {min}")]
    CooldownTooShort { cooldown: u64, min: u64 },

    #[error("expiration must be non-zero")]
    ZeroExpiration,

    // Timelock state
    #[error("operation {operation_hash} is not queued")]
    NotQueued { operation_hash: B256 },

    #[error("operation {operation_hash} is already queued")]
    AlreadyQueued { operation_hash: B256 },

    #[error("operation not ready until {ready_at}")]
    NotReady { ready_at: u64 },

    #[error("operation expired at {expired_at}")]
    Expired { expired_at: u64 },

    #[error("host clock reads zero")]
    ZeroTimestamp,

    // Hook composition
    #[error("hook {hook} is already installed")]
    HookAlreadyInstalled { hook: Address },

    #[error("hook {hook} is not installed")]
    HookNotInstalled { hook: Address },

    #[error("hook {hook} cannot be resolved")]
    UnknownHook { hook: Address },

    #[error("at most {max} hooks per account")]
    TooManyHooks { max: usize },

    #[error("hook data carries {actual} entries, {expected} hooks installed")]
    HookDataCountMismatch { expected: usize, actual: usize },
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, GuardError>;

/// Solidity custom errors mirroring [`GuardError`].
pub mod abi {
    use alloy_sol_types::sol;

    sol! {
        error NotAccount(address caller, address account);
        error NotOwner(address account, address initiator);
        error NotAccountOrOperator(address caller, address account, address operator);

        error NotInitialized(address smartAccount);
        error AlreadyInitialized(address smartAccount);
        error NotActivated(address smartAccount);
        error AlreadyActivated(address smartAccount);

        error TargetNotAllowed(address target);
        error CounterpartNotAllowed(address counterpart);
        error BeneficiaryMismatch(address supplied, address required);
        error UnsupportedExecutionMode(bytes32 mode);
        error UnsupportedSelector(bytes4 selector);
        error MalformedCallData();
        error EthValueForbidden(uint256 value);
        error DeadlineExpired(uint64 deadline, uint64 timestamp);
        error InvalidHookData();

        error PerCallLimitExceeded(uint256 amount, uint256 max);
        error DailyCapExceeded(uint256 attempted, uint256 cap);
        error ValueExceedsBound(uint256 value, uint64 bound);
        error CooldownTooShort(uint64 cooldown, uint64 min);
        error ZeroExpiration();

        error NotQueued(bytes32 operationHash);
        error AlreadyQueued(bytes32 operationHash);
        error NotReady(uint64 readyAt);
        error Expired(uint64 expiredAt);
        error ZeroTimestamp();

        error HookAlreadyInstalled(address hook);
        error HookNotInstalled(address hook);
        error UnknownHook(address hook);
        error TooManyHooks(uint256 max);
        error HookDataCountMismatch(uint256 expected, uint256 actual);
    }
}

impl GuardError {
    /// ABI-encoded revert data (`selector || args`) for this error.
    pub fn revert_data(&self) -> Vec<u8> {
        match self {
            GuardError::NotAccount { caller, account } => abi::NotAccount {
                caller: *caller,
                account: *account,
            }
            .abi_encode(),
            GuardError::NotOwner { account, initiator } => abi::NotOwner {
                account: *account,
                initiator: *initiator,
            }
            .abi_encode(),
            GuardError::NotAccountOrOperator {
                caller,
                account,
                operator,
            } => abi::NotAccountOrOperator {
                caller: *caller,
                account: *account,
                operator: *operator,
            }
            .abi_encode(),
            GuardError::NotInitialized { account } => abi::NotInitialized {
                smartAccount: *account,
            }
            .abi_encode(),
            GuardError::AlreadyInitialized { account } => abi::AlreadyInitialized {
                smartAccount: *account,
            }
            .abi_encode(),
            GuardError::NotActivated { account } => abi::NotActivated {
                smartAccount: *account,
            }
            .abi_encode(),
            GuardError::AlreadyActivated { account } => abi::AlreadyActivated {
                smartAccount: *account,
            }
            .abi_encode(),
            GuardError::TargetNotAllowed { target } => {
                abi::TargetNotAllowed { target: *target }.abi_encode()
            }
            GuardError::CounterpartNotAllowed { counterpart } => abi::CounterpartNotAllowed {
                counterpart: *counterpart,
            }
            .abi_encode(),
            GuardError::BeneficiaryMismatch { supplied, required } => abi::BeneficiaryMismatch {
                supplied: *supplied,
                required: *required,
            }
            .abi_encode(),
            GuardError::UnsupportedExecutionMode { mode } => {
                abi::UnsupportedExecutionMode { mode: *mode }.abi_encode()
            }
            GuardError::UnsupportedSelector { selector } => abi::UnsupportedSelector {
                selector: *selector,
            }
            .abi_encode(),
            GuardError::MalformedCallData(_) => abi::MalformedCallData {}.abi_encode(),
            GuardError::EthValueForbidden { value } => {
                abi::EthValueForbidden { value: *value }.abi_encode()
            }
            GuardError::DeadlineExpired { deadline, now } => abi::DeadlineExpired {
                deadline: *deadline,
                timestamp: *now,
            }
            .abi_encode(),
            GuardError::InvalidHookData => abi::InvalidHookData {}.abi_encode(),
            GuardError::PerCallLimitExceeded { amount, max } => abi::PerCallLimitExceeded {
                amount: *amount,
                max: *max,
            }
            .abi_encode(),
            GuardError::DailyCapExceeded { attempted, cap } => abi::DailyCapExceeded {
                attempted: *attempted,
                cap: *cap,
            }
            .abi_encode(),
            GuardError::ValueExceedsBound { value, bound } => abi::ValueExceedsBound {
                value: *value,
                bound: *bound,
            }
            .abi_encode(),
            GuardError::CooldownTooShort { cooldown, min } => abi::CooldownTooShort {
                cooldown: *cooldown,
                min: *min,
            }
            .abi_encode(),
            GuardError::ZeroExpiration => abi::ZeroExpiration {}.abi_encode(),
            GuardError::NotQueued { operation_hash } => abi::NotQueued {
                operationHash: *operation_hash,
            }
            .abi_encode(),
            GuardError::AlreadyQueued { operation_hash } => abi::AlreadyQueued {
                operationHash: *operation_hash,
            }
            .abi_encode(),
            GuardError::NotReady { ready_at } => abi::NotReady { readyAt: *ready_at }.abi_encode(),
            GuardError::Expired { expired_at } => abi::Expired {
                expiredAt: *expired_at,
            }
            .abi_encode(),
            GuardError::ZeroTimestamp => abi::ZeroTimestamp {}.abi_encode(),
            GuardError::HookAlreadyInstalled { hook } => {
                abi::HookAlreadyInstalled { hook: *hook }.abi_encode()
            }
            GuardError::HookNotInstalled { hook } => {
                abi::HookNotInstalled { hook: *hook }.abi_encode()
            }
            GuardError::UnknownHook { hook } => abi::UnknownHook { hook: *hook }.abi_encode(),
            GuardError::TooManyHooks { max } => abi::TooManyHooks {
                max: U256::from(*max),
            }
            .abi_encode(),
            GuardError::HookDataCountMismatch { expected, actual } => abi::HookDataCountMismatch {
                expected: U256::from(*expected),
                actual: U256::from(*actual),
            }
            .abi_encode(),
        }
    }
}
