//! JSON scenarios and the simulator that replays them.

use alloy_primitives::{Address, Bytes, Selector, B256, U256};
use delegate_guard::{
    ActionKind, ActionPolicy, GuardError, GuardEvent, Hook, PolicyConfig, TimelockHook,
};
use delegate_guard_encoder::{
    encoder::{encode_approve, encode_execute, encode_supply, encode_swap},
    host::GENESIS_TIMESTAMP,
    MockHost, SwapParams,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_start")]
    pub start_timestamp: u64,
    #[serde(default)]
    pub owners: Vec<OwnerEntry>,
    pub steps: Vec<Step>,
}

fn default_chain_id() -> u64 {
    1
}

fn default_start() -> u64 {
    GENESIS_TIMESTAMP
}

#[derive(Debug, Deserialize)]
pub struct OwnerEntry {
    pub account: Address,
    pub owner: Address,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Activate {
        account: Address,
        cooldown: u64,
        expiration: u64,
    },
    Deactivate {
        account: Address,
    },
    SetImmediate {
        account: Address,
        target: Address,
        selector: Selector,
        allowed: bool,
    },
    Queue {
        caller: Address,
        account: Address,
        operator: Address,
        #[serde(default)]
        value: U256,
        call: CallInput,
    },
    Warp {
        seconds: u64,
    },
    /// Run the timelock's pre- and post-check for an account call.
    Execute {
        account: Address,
        initiator: Address,
        #[serde(default)]
        value: U256,
        call: CallInput,
    },
    Cancel {
        account: Address,
        initiator: Address,
        operation_hash: B256,
    },
    InitPolicy {
        kind: ActionKind,
        account: Address,
        config: PolicyConfig,
    },
    CheckAction {
        kind: ActionKind,
        account: Address,
        #[serde(default)]
        value: U256,
        call: CallInput,
    },
    DailyUsed {
        kind: ActionKind,
        account: Address,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Activate { .. } => "activate",
            Step::Deactivate { .. } => "deactivate",
            Step::SetImmediate { .. } => "set_immediate",
            Step::Queue { .. } => "queue",
            Step::Warp { .. } => "warp",
            Step::Execute { .. } => "execute",
            Step::Cancel { .. } => "cancel",
            Step::InitPolicy { .. } => "init_policy",
            Step::CheckAction { .. } => "check_action",
            Step::DailyUsed { .. } => "daily_used",
        }
    }
}

/// The inner call an account would make, described by its decoded fields.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CallInput {
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Supply {
        pool: Address,
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
        #[serde(default)]
        referral_code: u16,
    },
    Swap {
        router: Address,
        token_in: Address,
        token_out: Address,
        fee: u32,
        recipient: Address,
        deadline: U256,
        amount_in: U256,
        #[serde(default)]
        amount_out_minimum: U256,
        #[serde(default)]
        sqrt_price_limit_x96: U256,
    },
    Raw {
        target: Address,
        data: Bytes,
    },
}

impl CallInput {
    pub fn target(&self) -> Address {
        match self {
            CallInput::Approve { token, .. } => *token,
            CallInput::Supply { pool, .. } => *pool,
            CallInput::Swap { router, .. } => *router,
            CallInput::Raw { target, .. } => *target,
        }
    }

    pub fn inner_calldata(&self) -> Vec<u8> {
        match self {
            CallInput::Approve {
                spender, amount, ..
            } => encode_approve(*spender, *amount),
            CallInput::Supply {
                asset,
                amount,
                on_behalf_of,
                referral_code,
                ..
            } => encode_supply(*asset, *amount, *on_behalf_of, *referral_code),
            CallInput::Swap {
                token_in,
                token_out,
                fee,
                recipient,
                deadline,
                amount_in,
                amount_out_minimum,
                sqrt_price_limit_x96,
                ..
            } => encode_swap(&SwapParams {
                token_in: *token_in,
                token_out: *token_out,
                fee: *fee,
                recipient: *recipient,
                deadline: *deadline,
                amount_in: *amount_in,
                amount_out_minimum: *amount_out_minimum,
                sqrt_price_limit_x96: *sqrt_price_limit_x96,
            }),
            CallInput::Raw { data, .. } => data.to_vec(),
        }
    }

    /// Account `execute` calldata wrapping this call in single mode.
    pub fn execute_calldata(&self) -> Vec<u8> {
        encode_execute(self.target(), U256::ZERO, &self.inner_calldata())
    }
}

#[derive(Debug, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    pub at: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revert_data: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub chain_id: u64,
    pub started_at: String,
    pub finished_at: String,
    pub passed: usize,
    pub failed: usize,
    pub steps: Vec<StepReport>,
}

/// Timelock and one policy per action kind over a shared [`MockHost`].
pub struct Simulator {
    host: MockHost,
    timelock: TimelockHook,
    approval: ActionPolicy,
    supply: ActionPolicy,
    swap: ActionPolicy,
}

impl Simulator {
    pub fn new(scenario: &Scenario) -> Self {
        let mut host = MockHost::new(scenario.start_timestamp, scenario.chain_id);
        for entry in &scenario.owners {
            host.add_owner(entry.account, entry.owner);
        }
        Self {
            host,
            timelock: TimelockHook::new(),
            approval: ActionPolicy::new(ActionKind::Approval),
            supply: ActionPolicy::new(ActionKind::Supply),
            swap: ActionPolicy::new(ActionKind::Swap),
        }
    }

    pub fn run(&mut self, steps: &[Step]) -> Report {
        let started_at = rfc3339(self.host.block_timestamp);
        let reports: Vec<StepReport> = steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect();
        let failed = reports.iter().filter(|r| !r.ok).count();
        Report {
            chain_id: self.host.chain_id,
            started_at,
            finished_at: rfc3339(self.host.block_timestamp),
            passed: reports.len() - failed,
            failed,
            steps: reports,
        }
    }

    fn run_step(&mut self, index: usize, step: &Step) -> StepReport {
        let outcome = self.apply(step);
        let events = self.drain_events().iter().map(event_json).collect();
        let at = rfc3339(self.host.block_timestamp);
        match outcome {
            Ok(output) => {
                tracing::debug!(index, op = step.name(), "step ok");
                StepReport {
                    index,
                    op: step.name(),
                    at,
                    ok: true,
                    output,
                    error: None,
                    revert_data: None,
                    events,
                }
            }
            Err(err) => {
                tracing::info!(index, op = step.name(), %err, "step reverted");
                StepReport {
                    index,
                    op: step.name(),
                    at,
                    ok: false,
                    output: Value::Null,
                    error: Some(err.to_string()),
                    revert_data: Some(format!("0x{}", hex::encode(err.revert_data()))),
                    events,
                }
            }
        }
    }

    fn apply(&mut self, step: &Step) -> Result<Value, GuardError> {
        let host = &self.host;
        match step {
            Step::Activate {
                account,
                cooldown,
                expiration,
            } => {
                self.timelock.activate(*account, *cooldown, *expiration)?;
                Ok(json!({ "config": self.timelock.config(*account) }))
            }
            Step::Deactivate { account } => {
                self.timelock.deactivate(*account)?;
                Ok(json!({ "config": self.timelock.config(*account) }))
            }
            Step::SetImmediate {
                account,
                target,
                selector,
                allowed,
            } => {
                self.timelock
                    .set_immediate_selector(*account, *target, *selector, *allowed);
                Ok(Value::Null)
            }
            Step::Queue {
                caller,
                account,
                operator,
                value,
                call,
            } => {
                let hash = self.timelock.queue_operation(
                    host,
                    *caller,
                    *account,
                    *operator,
                    *value,
                    &call.execute_calldata(),
                )?;
                let (ready_at, expires_at) = self
                    .timelock
                    .config(*account)
                    .schedule(host.block_timestamp);
                Ok(json!({
                    "operation_hash": hash.to_string(),
                    "ready_at": rfc3339(ready_at),
                    "expires_at": rfc3339(expires_at),
                }))
            }
            Step::Warp { seconds } => {
                self.host.warp(*seconds);
                Ok(json!({ "now": rfc3339(self.host.block_timestamp) }))
            }
            Step::Execute {
                account,
                initiator,
                value,
                call,
            } => {
                let hook_data = self.timelock.pre_check(
                    host,
                    *account,
                    *initiator,
                    *value,
                    &call.execute_calldata(),
                )?;
                self.timelock.post_check(host, *account, &hook_data)?;
                Ok(json!({ "hook_data": format!("0x{}", hex::encode(&hook_data)) }))
            }
            Step::Cancel {
                account,
                initiator,
                operation_hash,
            } => {
                self.timelock
                    .cancel_execution(host, *account, *initiator, *operation_hash)?;
                Ok(Value::Null)
            }
            Step::InitPolicy {
                kind,
                account,
                config,
            } => {
                let policy = match kind {
                    ActionKind::Approval => &mut self.approval,
                    ActionKind::Supply => &mut self.supply,
                    ActionKind::Swap => &mut self.swap,
                };
                policy.initialize(*account, *account, config.clone())?;
                Ok(Value::Null)
            }
            Step::CheckAction {
                kind,
                account,
                value,
                call,
            } => {
                let policy = match kind {
                    ActionKind::Approval => &mut self.approval,
                    ActionKind::Supply => &mut self.supply,
                    ActionKind::Swap => &mut self.swap,
                };
                let code = policy.check_action(
                    host,
                    B256::ZERO,
                    *account,
                    call.target(),
                    *value,
                    &call.inner_calldata(),
                )?;
                Ok(json!({
                    "code": code.to_string(),
                    "daily_used": policy.daily_used(host, *account)?.to_string(),
                }))
            }
            Step::DailyUsed { kind, account } => {
                let used = self.policy(*kind).daily_used(host, *account)?;
                Ok(json!({ "daily_used": used.to_string() }))
            }
        }
    }

    fn policy(&self, kind: ActionKind) -> &ActionPolicy {
        match kind {
            ActionKind::Approval => &self.approval,
            ActionKind::Supply => &self.supply,
            ActionKind::Swap => &self.swap,
        }
    }

    fn drain_events(&mut self) -> Vec<GuardEvent> {
        let mut events = self.timelock.drain_events();
        for policy in [&mut self.approval, &mut self.supply, &mut self.swap] {
            events.extend(policy.drain_events());
        }
        events
    }
}

fn event_json(event: &GuardEvent) -> Value {
    let log = event.log_data();
    json!({
        "event": format!("{event:?}"),
        "topics": log.topics().iter().map(|t| t.to_string()).collect::<Vec<_>>(),
        "data": format!("0x{}", hex::encode(&log.data)),
    })
}

/// RFC 3339 rendering of a block timestamp; falls back to the raw number when out of range.
pub fn rfc3339(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .and_then(|at| at.format(&Rfc3339).ok())
        .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000a1";
    const OWNER: &str = "0x000000000000000000000000000000000000000e";
    const OPERATOR: &str = "0x000000000000000000000000000000000000000b";
    const TOKEN: &str = "0x0000000000000000000000000000000000000070";
    const SPENDER: &str = "0x000000000000000000000000000000000000005b";

    fn approve() -> Value {
        json!({ "action": "approve", "token": TOKEN, "spender": SPENDER, "amount": "0x64" })
    }

    fn run(scenario: Value) -> Report {
        let scenario: Scenario = serde_json::from_value(scenario).unwrap();
        Simulator::new(&scenario).run(&scenario.steps)
    }

    #[test]
    fn queued_call_executes_after_cooldown() {
        let report = run(json!({
            "owners": [{ "account": ACCOUNT, "owner": OWNER }],
            "steps": [
                { "op": "activate", "account": ACCOUNT, "cooldown": 3600, "expiration": 86400 },
                { "op": "execute", "account": ACCOUNT, "initiator": OPERATOR, "call": approve() },
                { "op": "queue", "caller": OPERATOR, "account": ACCOUNT, "operator": OPERATOR, "call": approve() },
                { "op": "warp", "seconds": 3600 },
                { "op": "execute", "account": ACCOUNT, "initiator": OPERATOR, "call": approve() },
                { "op": "execute", "account": ACCOUNT, "initiator": OWNER, "call": approve() },
            ]
        }));

        let oks: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
        assert_eq!(oks, [true, false, true, true, true, true]);
        assert_eq!(report.failed, 1);

        let rejected = &report.steps[1];
        assert!(rejected.error.as_deref().unwrap().contains("not queued"));
        assert!(rejected.revert_data.as_deref().unwrap().starts_with("0x"));
        assert_eq!(report.steps[2].events.len(), 1);
        assert_eq!(report.started_at, "2023-11-14T22:13:20Z");
    }

    #[test]
    fn policy_steps_meter_usage() {
        let report = run(json!({
            "steps": [
                {
                    "op": "init_policy",
                    "kind": "approval",
                    "account": ACCOUNT,
                    "config": {
                        "allowed_targets": [TOKEN],
                        "allowed_counterparts": [SPENDER],
                        "max_per_call": "0x64",
                        "daily_cap": "0xc8"
                    }
                },
                { "op": "check_action", "kind": "approval", "account": ACCOUNT, "call": approve() },
                { "op": "check_action", "kind": "approval", "account": ACCOUNT, "call": approve() },
                { "op": "check_action", "kind": "approval", "account": ACCOUNT, "call": approve() },
                { "op": "daily_used", "kind": "approval", "account": ACCOUNT },
            ]
        }));

        let oks: Vec<bool> = report.steps.iter().map(|s| s.ok).collect();
        assert_eq!(oks, [true, true, true, false, true]);
        assert_eq!(report.steps[4].output["daily_used"], "200");
    }

    #[test]
    fn rfc3339_renders_and_falls_back() {
        assert_eq!(rfc3339(0), "1970-01-01T00:00:00Z");
        assert_eq!(rfc3339(u64::MAX), u64::MAX.to_string());
    }
}
