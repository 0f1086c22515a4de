//! Action policy engine.
//!
//! One [`ActionPolicy`] per action kind. A policy decodes the call it is shown, checks the
//! decoded addresses against the account's allow-lists, insists the account itself is the
//! beneficiary, and meters the amount against a per-call maximum and a rolling daily cap.
//! Policies only govern token-denominated calls; any native value is rejected outright.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolValue;
use delegate_guard_types::{ActionKind, Host};
use serde::{Deserialize, Serialize};

use crate::{
    decoder::{decode_action, ActionCall},
    errors::{DecodeError, GuardError, Result},
    events::{EventLog, GuardEvent},
    ledger::{day_index, UsageWindow},
    module::constants::{MODULE_TYPE_POLICY, POLICY_FAILED_UINT, POLICY_SUCCESS_UINT},
};

/// Per-account policy configuration. Written once, by the account itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Contracts the call may be sent to (token, lending pool, router).
    pub allowed_targets: BTreeSet<Address>,
    /// Spenders, assets or swap tokens, depending on the action kind.
    pub allowed_counterparts: BTreeSet<Address>,
    pub max_per_call: U256,
    pub daily_cap: U256,
}

impl PolicyConfig {
    /// Decode install data:
    /// `abi.encode(address[] allowedTargets, address[] allowedCounterparts, uint256 maxPerCall, uint256 dailyCap)`.
    pub fn decode_install_data(data: &[u8]) -> Result<Self> {
        let (targets, counterparts, max_per_call, daily_cap) =
            <(Vec<Address>, Vec<Address>, U256, U256)>::abi_decode_params(data, true)
                .map_err(|_| DecodeError::Abi)?;
        Ok(PolicyConfig {
            allowed_targets: targets.into_iter().collect(),
            allowed_counterparts: counterparts.into_iter().collect(),
            max_per_call,
            daily_cap,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct PolicyRecord {
    config: PolicyConfig,
    usage: UsageWindow,
}

/// Validator for one action kind, holding every account's config and usage window.
#[derive(Debug)]
pub struct ActionPolicy {
    kind: ActionKind,
    records: BTreeMap<Address, PolicyRecord>,
    events: EventLog,
}

impl ActionPolicy {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            records: BTreeMap::new(),
            events: EventLog::default(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Set `account`'s config. Only the account may call this, and only once.
    pub fn initialize(
        &mut self,
        caller: Address,
        account: Address,
        config: PolicyConfig,
    ) -> Result<()> {
        if caller != account {
            return Err(GuardError::NotAccount { caller, account });
        }
        if self.records.contains_key(&account) {
            return Err(GuardError::AlreadyInitialized { account });
        }

        tracing::info!(
            %account,
            kind = %self.kind,
            targets = config.allowed_targets.len(),
            counterparts = config.allowed_counterparts.len(),
            "policy initialized"
        );
        self.records.insert(
            account,
            PolicyRecord {
                config,
                usage: UsageWindow::default(),
            },
        );
        self.events.emit(GuardEvent::PolicyInitialized {
            account,
            kind: self.kind,
        });
        Ok(())
    }

    /// ERC-7579 install hook; `account` is the installing account.
    pub fn on_install(&mut self, account: Address, data: &[u8]) -> Result<()> {
        let config = PolicyConfig::decode_install_data(data)?;
        self.initialize(account, account, config)
    }

    pub fn is_module_type(&self, module_type_id: U256) -> bool {
        module_type_id == MODULE_TYPE_POLICY
    }

    pub fn is_initialized(&self, account: Address) -> bool {
        self.records.contains_key(&account)
    }

    pub fn config(&self, account: Address) -> Option<&PolicyConfig> {
        self.records.get(&account).map(|r| &r.config)
    }

    /// Amount used today, with the lazy reset applied to the view only.
    pub fn daily_used(&self, host: &dyn Host, account: Address) -> Result<U256> {
        let record = self
            .records
            .get(&account)
            .ok_or(GuardError::NotInitialized { account })?;
        Ok(record.usage.used_on(day_index(host.block_timestamp())))
    }

    /// Check one call and, on success, commit its amount to the usage window.
    ///
    /// Returns [`POLICY_SUCCESS_UINT`]. On any error nothing is committed.
    pub fn check_action(
        &mut self,
        host: &dyn Host,
        correlation_id: B256,
        account: Address,
        target: Address,
        eth_value: U256,
        call_data: &[u8],
    ) -> Result<U256> {
        match self.evaluate(host, account, target, eth_value, call_data) {
            Ok(usage) => {
                if let Some(record) = self.records.get_mut(&account) {
                    record.usage = usage;
                }
                tracing::debug!(
                    %account,
                    %correlation_id,
                    kind = %self.kind,
                    used_today = %usage.used_amount,
                    "action allowed"
                );
                Ok(POLICY_SUCCESS_UINT)
            }
            Err(err) => {
                tracing::warn!(%account, %correlation_id, kind = %self.kind, %err, "action rejected");
                Err(err)
            }
        }
    }

    /// Kernel-style variant of [`Self::check_action`]: zero on success, non-zero on any failure.
    pub fn check_action_code(
        &mut self,
        host: &dyn Host,
        correlation_id: B256,
        account: Address,
        target: Address,
        eth_value: U256,
        call_data: &[u8],
    ) -> U256 {
        self.check_action(host, correlation_id, account, target, eth_value, call_data)
            .unwrap_or(POLICY_FAILED_UINT)
    }

    pub fn events(&self) -> &[GuardEvent] {
        self.events.as_slice()
    }

    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        self.events.drain()
    }

    /// Run every check and return the usage window to commit.
    fn evaluate(
        &self,
        host: &dyn Host,
        account: Address,
        target: Address,
        eth_value: U256,
        call_data: &[u8],
    ) -> Result<UsageWindow> {
        let record = self
            .records
            .get(&account)
            .ok_or(GuardError::NotInitialized { account })?;
        let config = &record.config;

        if eth_value != U256::ZERO {
            return Err(GuardError::EthValueForbidden { value: eth_value });
        }

        let call = decode_action(self.kind, call_data)?;

        if !config.allowed_targets.contains(&target) {
            return Err(GuardError::TargetNotAllowed { target });
        }
        for counterpart in call.counterparts() {
            if !config.allowed_counterparts.contains(&counterpart) {
                return Err(GuardError::CounterpartNotAllowed { counterpart });
            }
        }
        if let Some(supplied) = call.beneficiary() {
            if supplied != account {
                return Err(GuardError::BeneficiaryMismatch {
                    supplied,
                    required: account,
                });
            }
        }

        let now = host.block_timestamp();
        check_deadline(&call, now)?;

        let amount = call.amount();
        if amount > config.max_per_call {
            return Err(GuardError::PerCallLimitExceeded {
                amount,
                max: config.max_per_call,
            });
        }

        let usage = record
            .usage
            .advanced(day_index(now), amount)
            .ok_or(GuardError::DailyCapExceeded {
                attempted: U256::MAX,
                cap: config.daily_cap,
            })?;
        if usage.used_amount > config.daily_cap {
            return Err(GuardError::DailyCapExceeded {
                attempted: usage.used_amount,
                cap: config.daily_cap,
            });
        }
        Ok(usage)
    }
}

fn check_deadline(call: &ActionCall, now: u64) -> Result<()> {
    if let Some(deadline) = call.deadline() {
        if deadline < U256::from(now) {
            return Err(GuardError::DeadlineExpired {
                deadline: deadline.to::<u64>(),
                now,
            });
        }
    }
    Ok(())
}
