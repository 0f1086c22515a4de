//! Operator timelock.
//!
//! Operators queue an exact account call, wait out the account's cooldown, then have a
//! bounded window in which that call may execute once. Owners bypass the queue entirely, as
//! do target+selector pairs the account marks immediate. Owners can cancel any live entry.
//!
//! Per (account, operation hash) the states are
//! `Unqueued -> Queued -> {Ready, Expired, Cancelled}` and `Ready -> Consumed`.
//! `pre_check` only checks a queued entry; the paired `post_check` consumes it, so a call
//! rejected by another hook between the two phases leaves the entry live. An entry found
//! expired is consumed by `pre_check` itself.
//!
//! Deactivation bumps the account's generation instead of deleting entries. Entries from an
//! older generation stay in storage but are never live again.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, Selector, B256, U256};
use delegate_guard_types::Host;
use serde::{Deserialize, Serialize};

use crate::{
    decoder::decode_execution,
    errors::{GuardError, Result},
    events::{EventLog, GuardEvent},
    hooks::Hook,
    module::constants::{MAX_UINT48, MIN_COOLDOWN, MODULE_TYPE_HOOK},
    utils::{
        bytes::{expect_end, read_u256},
        hashing::operation_hash,
    },
};

/// Per-account timelock configuration.
///
/// Active while `cooldown != 0`. `generation` outlives deactivation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelockConfig {
    pub cooldown: u64,
    pub expiration: u64,
    pub generation: u64,
}

impl TimelockConfig {
    pub fn is_active(&self) -> bool {
        self.cooldown != 0
    }

    /// `(ready_at, expires_at)` of an entry queued at `queued_at`.
    pub fn schedule(&self, queued_at: u64) -> (u64, u64) {
        let ready_at = queued_at.saturating_add(self.cooldown);
        (ready_at, ready_at.saturating_add(self.expiration))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    pub operator: Address,
    pub queued_at: u64,
    /// Executed or cancelled.
    pub consumed: bool,
    pub generation: u64,
}

impl QueueEntry {
    pub fn is_live(&self, config: &TimelockConfig) -> bool {
        self.queued_at != 0 && !self.consumed && self.generation == config.generation
    }
}

/// Time-evaluated view of a queued operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationState {
    Unqueued,
    Pending { ready_at: u64 },
    Ready { expires_at: u64 },
    Expired { expired_at: u64 },
    Consumed,
}

/// Hook data returned by the timelock's `pre_check`, naming the branch that allowed the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelockHookData {
    OwnerBypass,
    ImmediateSelector,
    QueuedExecution { operation_hash: B256 },
}

impl TimelockHookData {
    const OWNER_BYPASS: u8 = 0x00;
    const IMMEDIATE_SELECTOR: u8 = 0x01;
    const QUEUED_EXECUTION: u8 = 0x02;

    pub fn encode(&self) -> Bytes {
        match self {
            TimelockHookData::OwnerBypass => Bytes::from(vec![Self::OWNER_BYPASS]),
            TimelockHookData::ImmediateSelector => Bytes::from(vec![Self::IMMEDIATE_SELECTOR]),
            TimelockHookData::QueuedExecution { operation_hash } => {
                let mut buf = Vec::with_capacity(1 + 32);
                buf.push(Self::QUEUED_EXECUTION);
                buf.extend_from_slice(operation_hash.as_slice());
                Bytes::from(buf)
            }
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        match data {
            [Self::OWNER_BYPASS] => Ok(TimelockHookData::OwnerBypass),
            [Self::IMMEDIATE_SELECTOR] => Ok(TimelockHookData::ImmediateSelector),
            [Self::QUEUED_EXECUTION, hash @ ..] if hash.len() == 32 => {
                Ok(TimelockHookData::QueuedExecution {
                    operation_hash: B256::from_slice(hash),
                })
            }
            _ => Err(GuardError::InvalidHookData),
        }
    }
}

/// Timelock state of every account.
#[derive(Debug, Default)]
pub struct TimelockHook {
    configs: BTreeMap<Address, TimelockConfig>,
    queue: BTreeMap<(Address, B256), QueueEntry>,
    immediate: BTreeSet<(Address, Address, Selector)>,
    events: EventLog,
}

impl TimelockHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn the timelock on for `account`, continuing its current generation.
    pub fn activate(&mut self, account: Address, cooldown: u64, expiration: u64) -> Result<()> {
        let current = self.config(account);
        if current.is_active() {
            return Err(GuardError::AlreadyActivated { account });
        }
        validate_window(cooldown, expiration)?;
        self.store_config(
            account,
            TimelockConfig {
                cooldown,
                expiration,
                generation: current.generation,
            },
        );
        Ok(())
    }

    /// Change cooldown and expiration of an active timelock. Queued entries stay live and are
    /// measured against the new values.
    pub fn update_config(&mut self, account: Address, cooldown: u64, expiration: u64) -> Result<()> {
        let current = self.config(account);
        if !current.is_active() {
            return Err(GuardError::NotActivated { account });
        }
        validate_window(cooldown, expiration)?;
        self.store_config(
            account,
            TimelockConfig {
                cooldown,
                expiration,
                generation: current.generation,
            },
        );
        Ok(())
    }

    /// Turn the timelock off and move to a fresh generation, orphaning every queued entry.
    pub fn deactivate(&mut self, account: Address) -> Result<()> {
        let current = self.config(account);
        if !current.is_active() {
            return Err(GuardError::NotActivated { account });
        }
        let generation = current.generation.saturating_add(1);
        self.configs.insert(
            account,
            TimelockConfig {
                cooldown: 0,
                expiration: 0,
                generation,
            },
        );
        tracing::info!(%account, generation, "timelock deactivated");
        self.events
            .emit(GuardEvent::TimelockDeactivated { account, generation });
        Ok(())
    }

    /// ERC-7579 install hook. `data = abi.encode(uint48 cooldown, uint48 expiration)`.
    pub fn on_install(&mut self, account: Address, data: &[u8]) -> Result<()> {
        let mut i = 0usize;
        let cooldown = bounded_u48(read_u256(data, &mut i)?)?;
        let expiration = bounded_u48(read_u256(data, &mut i)?)?;
        expect_end(data, i)?;
        self.activate(account, cooldown, expiration)
    }

    /// ERC-7579 uninstall hook.
    pub fn on_uninstall(&mut self, account: Address, _data: &[u8]) -> Result<()> {
        self.deactivate(account)
    }

    pub fn is_module_type(&self, module_type_id: U256) -> bool {
        module_type_id == MODULE_TYPE_HOOK
    }

    pub fn is_initialized(&self, account: Address) -> bool {
        self.config(account).is_active()
    }

    /// Current config; all-zero for an account that never activated.
    pub fn config(&self, account: Address) -> TimelockConfig {
        self.configs.get(&account).copied().unwrap_or_default()
    }

    pub fn set_immediate_selector(
        &mut self,
        account: Address,
        target: Address,
        selector: Selector,
        allowed: bool,
    ) {
        if allowed {
            self.immediate.insert((account, target, selector));
        } else {
            self.immediate.remove(&(account, target, selector));
        }
        tracing::info!(%account, %target, %selector, allowed, "immediate selector set");
        self.events.emit(GuardEvent::ImmediateSelectorSet {
            account,
            target,
            selector,
            allowed,
        });
    }

    pub fn is_immediate(&self, account: Address, target: Address, selector: Selector) -> bool {
        self.immediate.contains(&(account, target, selector))
    }

    /// Hash under which `operator`'s call is queued for `account` on the host's network.
    pub fn operation_hash(
        &self,
        host: &dyn Host,
        account: Address,
        operator: Address,
        value: U256,
        call_data: &[u8],
    ) -> B256 {
        operation_hash(account, host.chain_id(), operator, value, call_data)
    }

    /// Queue `operator`'s future call. `caller` must be the account or the operator.
    pub fn queue_operation(
        &mut self,
        host: &dyn Host,
        caller: Address,
        account: Address,
        operator: Address,
        value: U256,
        call_data: &[u8],
    ) -> Result<B256> {
        if caller != account && caller != operator {
            tracing::warn!(%caller, %account, %operator, "queue rejected: unauthorized caller");
            return Err(GuardError::NotAccountOrOperator {
                caller,
                account,
                operator,
            });
        }
        let config = self.config(account);
        if !config.is_active() {
            return Err(GuardError::NotActivated { account });
        }
        // A zero `queued_at` marks an absent entry.
        let queued_at = host.block_timestamp();
        if queued_at == 0 {
            return Err(GuardError::ZeroTimestamp);
        }

        let hash = self.operation_hash(host, account, operator, value, call_data);
        if self.live_entry(account, hash, &config).is_some() {
            return Err(GuardError::AlreadyQueued {
                operation_hash: hash,
            });
        }

        self.queue.insert(
            (account, hash),
            QueueEntry {
                operator,
                queued_at,
                consumed: false,
                generation: config.generation,
            },
        );

        let (ready_at, expires_at) = config.schedule(queued_at);
        tracing::info!(%account, %operator, operation_hash = %hash, ready_at, expires_at, "operation queued");
        self.events.emit(GuardEvent::OperationQueued {
            account,
            operator,
            operation_hash: hash,
            ready_at,
            expires_at,
        });
        Ok(hash)
    }

    /// Owner-only cancellation of a live entry. Terminal.
    pub fn cancel_execution(
        &mut self,
        host: &dyn Host,
        account: Address,
        initiator: Address,
        operation_hash: B256,
    ) -> Result<()> {
        if !host.is_owner(account, initiator) {
            tracing::warn!(%account, %initiator, "cancel rejected: not an owner");
            return Err(GuardError::NotOwner { account, initiator });
        }
        let config = self.config(account);
        let entry = self
            .live_entry_mut(account, operation_hash, &config)
            .ok_or(GuardError::NotQueued { operation_hash })?;
        entry.consumed = true;

        tracing::info!(%account, %initiator, %operation_hash, "operation cancelled");
        self.events.emit(GuardEvent::OperationCancelled {
            account,
            initiator,
            operation_hash,
        });
        Ok(())
    }

    /// The live entry under `operation_hash`, if any.
    pub fn queue_entry(&self, account: Address, operation_hash: B256) -> Option<QueueEntry> {
        let config = self.config(account);
        self.live_entry(account, operation_hash, &config).copied()
    }

    /// Where `operation_hash` stands at the host's current time. Read-only.
    pub fn operation_state(
        &self,
        host: &dyn Host,
        account: Address,
        operation_hash: B256,
    ) -> OperationState {
        let config = self.config(account);
        let Some(entry) = self.queue.get(&(account, operation_hash)) else {
            return OperationState::Unqueued;
        };
        if entry.queued_at == 0 || entry.generation != config.generation {
            return OperationState::Unqueued;
        }
        if entry.consumed {
            return OperationState::Consumed;
        }

        let now = host.block_timestamp();
        let (ready_at, expires_at) = config.schedule(entry.queued_at);
        if now < ready_at {
            OperationState::Pending { ready_at }
        } else if now > expires_at {
            OperationState::Expired {
                expired_at: expires_at,
            }
        } else {
            OperationState::Ready { expires_at }
        }
    }

    pub fn events(&self) -> &[GuardEvent] {
        self.events.as_slice()
    }

    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        self.events.drain()
    }

    /// Decide whether `initiator` may run `call_data` now. Commits nothing unless the entry expired.
    fn authorize(
        &mut self,
        host: &dyn Host,
        account: Address,
        initiator: Address,
        value: U256,
        call_data: &[u8],
    ) -> Result<TimelockHookData> {
        let config = self.config(account);
        if !config.is_active() {
            return Err(GuardError::NotActivated { account });
        }

        if host.is_owner(account, initiator) {
            tracing::debug!(%account, %initiator, "owner bypass");
            return Ok(TimelockHookData::OwnerBypass);
        }

        let execution = decode_execution(call_data)?;
        let selector = execution.selector();
        if self.is_immediate(account, execution.target, selector) {
            tracing::debug!(%account, target = %execution.target, %selector, "immediate selector");
            return Ok(TimelockHookData::ImmediateSelector);
        }

        let hash = self.operation_hash(host, account, initiator, value, call_data);
        let now = host.block_timestamp();
        let entry = self
            .live_entry_mut(account, hash, &config)
            .ok_or(GuardError::NotQueued {
                operation_hash: hash,
            })?;

        let (ready_at, expires_at) = config.schedule(entry.queued_at);
        if now < ready_at {
            return Err(GuardError::NotReady { ready_at });
        }
        if now > expires_at {
            // An expired entry must not be replayable.
            entry.consumed = true;
            tracing::warn!(%account, %initiator, operation_hash = %hash, expires_at, "queued operation expired");
            return Err(GuardError::Expired {
                expired_at: expires_at,
            });
        }

        tracing::debug!(%account, operator = %initiator, operation_hash = %hash, "queued operation ready");
        Ok(TimelockHookData::QueuedExecution {
            operation_hash: hash,
        })
    }

    /// Mark a queued operation executed once the account call went through.
    fn consume(&mut self, account: Address, operation_hash: B256) -> Result<()> {
        let config = self.config(account);
        let entry = self
            .live_entry_mut(account, operation_hash, &config)
            .ok_or(GuardError::NotQueued { operation_hash })?;
        entry.consumed = true;
        let operator = entry.operator;

        tracing::info!(%account, %operator, %operation_hash, "queued operation executed");
        self.events.emit(GuardEvent::OperationExecuted {
            account,
            operator,
            operation_hash,
        });
        Ok(())
    }

    fn store_config(&mut self, account: Address, config: TimelockConfig) {
        self.configs.insert(account, config);
        tracing::info!(
            %account,
            cooldown = config.cooldown,
            expiration = config.expiration,
            generation = config.generation,
            "timelock configured"
        );
        self.events.emit(GuardEvent::TimelockConfigured {
            account,
            cooldown: config.cooldown,
            expiration: config.expiration,
            generation: config.generation,
        });
    }

    fn live_entry(
        &self,
        account: Address,
        operation_hash: B256,
        config: &TimelockConfig,
    ) -> Option<&QueueEntry> {
        self.queue
            .get(&(account, operation_hash))
            .filter(|e| e.is_live(config))
    }

    fn live_entry_mut(
        &mut self,
        account: Address,
        operation_hash: B256,
        config: &TimelockConfig,
    ) -> Option<&mut QueueEntry> {
        self.queue
            .get_mut(&(account, operation_hash))
            .filter(|e| e.is_live(config))
    }
}

impl Hook for TimelockHook {
    fn pre_check(
        &mut self,
        host: &dyn Host,
        account: Address,
        initiator: Address,
        value: U256,
        call_data: &[u8],
    ) -> Result<Bytes> {
        self.authorize(host, account, initiator, value, call_data)
            .map(|data| data.encode())
    }

    fn post_check(&mut self, _host: &dyn Host, account: Address, hook_data: &[u8]) -> Result<()> {
        match TimelockHookData::decode(hook_data)? {
            TimelockHookData::QueuedExecution { operation_hash } => {
                self.consume(account, operation_hash)
            }
            data => {
                tracing::debug!(%account, ?data, "timelock post-check");
                Ok(())
            }
        }
    }
}

fn validate_window(cooldown: u64, expiration: u64) -> Result<()> {
    for value in [cooldown, expiration] {
        if value > MAX_UINT48 {
            return Err(GuardError::ValueExceedsBound {
                value: U256::from(value),
                bound: MAX_UINT48,
            });
        }
    }
    if cooldown <= MIN_COOLDOWN {
        return Err(GuardError::CooldownTooShort {
            cooldown,
            min: MIN_COOLDOWN,
        });
    }
    if expiration == 0 {
        return Err(GuardError::ZeroExpiration);
    }
    Ok(())
}

fn bounded_u48(word: U256) -> Result<u64> {
    if word > U256::from(MAX_UINT48) {
        return Err(GuardError::ValueExceedsBound {
            value: word,
            bound: MAX_UINT48,
        });
    }
    Ok(word.to::<u64>())
}
