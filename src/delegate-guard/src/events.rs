//! Observational notifications.
//!
//! Modules append [`GuardEvent`]s to their own [`EventLog`]; nothing in the guard reads
//! them back. Each event mirrors a Solidity event so it can be rendered as EVM log data.

use alloy_primitives::{Address, LogData, Selector, B256};
use alloy_sol_types::{sol, SolEvent};
use delegate_guard_types::ActionKind;

sol! {
    event TimelockConfigured(address indexed account, uint64 cooldown, uint64 expiration, uint64 generation);
    event TimelockDeactivated(address indexed account, uint64 generation);
    event OperationQueued(address indexed account, address indexed operator, bytes32 indexed operationHash, uint64 readyAt, uint64 expiresAt);
    event OperationExecuted(address indexed account, address indexed operator, bytes32 indexed operationHash);
    event OperationCancelled(address indexed account, address indexed initiator, bytes32 indexed operationHash);
    event ImmediateSelectorSet(address indexed account, address indexed target, bytes4 selector, bool allowed);
    event PolicyInitialized(address indexed account, uint8 kind);
    event HookAdded(address indexed account, address indexed hook);
    event HookRemoved(address indexed account, address indexed hook);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardEvent {
    TimelockConfigured {
        account: Address,
        cooldown: u64,
        expiration: u64,
        generation: u64,
    },
    TimelockDeactivated {
        account: Address,
        generation: u64,
    },
    OperationQueued {
        account: Address,
        operator: Address,
        operation_hash: B256,
        ready_at: u64,
        expires_at: u64,
    },
    OperationExecuted {
        account: Address,
        operator: Address,
        operation_hash: B256,
    },
    OperationCancelled {
        account: Address,
        initiator: Address,
        operation_hash: B256,
    },
    ImmediateSelectorSet {
        account: Address,
        target: Address,
        selector: Selector,
        allowed: bool,
    },
    PolicyInitialized {
        account: Address,
        kind: ActionKind,
    },
    HookAdded {
        account: Address,
        hook: Address,
    },
    HookRemoved {
        account: Address,
        hook: Address,
    },
}

impl GuardEvent {
    /// EVM log rendering (topics + data) of this event.
    pub fn log_data(&self) -> LogData {
        match self {
            GuardEvent::TimelockConfigured {
                account,
                cooldown,
                expiration,
                generation,
            } => TimelockConfigured {
                account: *account,
                cooldown: *cooldown,
                expiration: *expiration,
                generation: *generation,
            }
            .encode_log_data(),
            GuardEvent::TimelockDeactivated {
                account,
                generation,
            } => TimelockDeactivated {
                account: *account,
                generation: *generation,
            }
            .encode_log_data(),
            GuardEvent::OperationQueued {
                account,
                operator,
                operation_hash,
                ready_at,
                expires_at,
            } => OperationQueued {
                account: *account,
                operator: *operator,
                operationHash: *operation_hash,
                readyAt: *ready_at,
                expiresAt: *expires_at,
            }
            .encode_log_data(),
            GuardEvent::OperationExecuted {
                account,
                operator,
                operation_hash,
            } => OperationExecuted {
                account: *account,
                operator: *operator,
                operationHash: *operation_hash,
            }
            .encode_log_data(),
            GuardEvent::OperationCancelled {
                account,
                initiator,
                operation_hash,
            } => OperationCancelled {
                account: *account,
                initiator: *initiator,
                operationHash: *operation_hash,
            }
            .encode_log_data(),
            GuardEvent::ImmediateSelectorSet {
                account,
                target,
                selector,
                allowed,
            } => ImmediateSelectorSet {
                account: *account,
                target: *target,
                selector: *selector,
                allowed: *allowed,
            }
            .encode_log_data(),
            GuardEvent::PolicyInitialized { account, kind } => PolicyInitialized {
                account: *account,
                kind: *kind as u8,
            }
            .encode_log_data(),
            GuardEvent::HookAdded { account, hook } => HookAdded {
                account: *account,
                hook: *hook,
            }
            .encode_log_data(),
            GuardEvent::HookRemoved { account, hook } => HookRemoved {
                account: *account,
                hook: *hook,
            }
            .encode_log_data(),
        }
    }
}

/// Append-only notification log owned by one module.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<GuardEvent>,
}

impl EventLog {
    pub fn emit(&mut self, event: GuardEvent) {
        tracing::debug!(?event, "guard event");
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[GuardEvent] {
        &self.events
    }

    /// Hand the accumulated events to the caller, leaving the log empty.
    pub fn drain(&mut self) -> Vec<GuardEvent> {
        core::mem::take(&mut self.events)
    }
}
