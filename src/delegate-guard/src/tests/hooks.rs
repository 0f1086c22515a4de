use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use delegate_guard_encoder::MockHost;
use delegate_guard_types::Host;

use super::{account, addr, approve_call, operator, owner};
use crate::{
    errors::{GuardError, Result},
    events::GuardEvent,
    hooks::{Hook, HookResolver, MultiHook},
    module::constants::MAX_HOOKS,
    timelock::{OperationState, TimelockHook},
};

type Journal = Rc<RefCell<Vec<String>>>;

/// Records every call into a shared journal; optionally refuses in `pre_check`.
struct Recorder {
    name: &'static str,
    journal: Journal,
    refuse: bool,
}

impl Recorder {
    fn new(name: &'static str, journal: &Journal) -> Self {
        Self {
            name,
            journal: journal.clone(),
            refuse: false,
        }
    }
}

impl Hook for Recorder {
    fn pre_check(
        &mut self,
        _host: &dyn Host,
        _account: Address,
        _initiator: Address,
        _value: U256,
        _call_data: &[u8],
    ) -> Result<Bytes> {
        self.journal.borrow_mut().push(format!("pre:{}", self.name));
        if self.refuse {
            return Err(GuardError::InvalidHookData);
        }
        Ok(Bytes::copy_from_slice(self.name.as_bytes()))
    }

    fn post_check(&mut self, _host: &dyn Host, _account: Address, hook_data: &[u8]) -> Result<()> {
        let data = String::from_utf8_lossy(hook_data);
        self.journal
            .borrow_mut()
            .push(format!("post:{}:{data}", self.name));
        Ok(())
    }
}

fn recorder_addr(i: u8) -> Address {
    addr(0xC0 + i)
}

fn recorders(journal: &Journal, names: &[&'static str]) -> BTreeMap<Address, Box<dyn Hook>> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let unit: Box<dyn Hook> = Box::new(Recorder::new(*name, journal));
            (recorder_addr(i as u8), unit)
        })
        .collect()
}

fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn post_check_runs_in_reverse_with_own_data() {
    let host = MockHost::default();
    let log = journal();
    let mut multi = MultiHook::new(recorders(&log, &["a", "b", "c"]));
    for i in 0..3 {
        multi.add_hook(account(), recorder_addr(i)).unwrap();
    }

    let data = multi
        .pre_check(&host, account(), operator(), U256::ZERO, &approve_call(1))
        .unwrap();
    let per_hook = Vec::<Bytes>::abi_decode(&data, true).unwrap();
    assert_eq!(per_hook.len(), 3);

    multi.post_check(&host, account(), &data).unwrap();
    assert_eq!(
        *log.borrow(),
        ["pre:a", "pre:b", "pre:c", "post:c:c", "post:b:b", "post:a:a"]
    );
}

#[test]
fn first_refusal_stops_the_chain() {
    let host = MockHost::default();
    let log = journal();
    let mut units = recorders(&log, &["a", "b"]);
    let mut refusing = Recorder::new("x", &log);
    refusing.refuse = true;
    units.insert(recorder_addr(9), Box::new(refusing));

    let mut multi = MultiHook::new(units);
    multi.add_hook(account(), recorder_addr(0)).unwrap();
    multi.add_hook(account(), recorder_addr(9)).unwrap();
    multi.add_hook(account(), recorder_addr(1)).unwrap();

    assert_eq!(
        multi.pre_check(&host, account(), operator(), U256::ZERO, &[]),
        Err(GuardError::InvalidHookData)
    );
    assert_eq!(*log.borrow(), ["pre:a", "pre:x"]);
}

#[test]
fn empty_list_allows_everything() {
    let host = MockHost::default();
    let mut multi = MultiHook::new(recorders(&journal(), &[]));
    let data = multi
        .pre_check(&host, account(), operator(), U256::ZERO, &[0xff])
        .unwrap();
    assert!(Vec::<Bytes>::abi_decode(&data, true).unwrap().is_empty());
    multi.post_check(&host, account(), &data).unwrap();
}

#[test]
fn add_hook_guards() {
    let log = journal();
    let names: Vec<&'static str> = vec!["h"; MAX_HOOKS + 1];
    let mut multi = MultiHook::new(recorders(&log, &names));

    let unknown = addr(0x01);
    assert_eq!(
        multi.add_hook(account(), unknown),
        Err(GuardError::UnknownHook { hook: unknown })
    );

    for i in 0..MAX_HOOKS {
        multi.add_hook(account(), recorder_addr(i as u8)).unwrap();
    }
    assert_eq!(
        multi.add_hook(account(), recorder_addr(0)),
        Err(GuardError::HookAlreadyInstalled {
            hook: recorder_addr(0)
        })
    );
    assert_eq!(
        multi.add_hook(account(), recorder_addr(MAX_HOOKS as u8)),
        Err(GuardError::TooManyHooks { max: MAX_HOOKS })
    );
    assert_eq!(multi.hooks(account()).len(), MAX_HOOKS);

    // Lists are per account.
    multi.add_hook(owner(), recorder_addr(0)).unwrap();
    assert_eq!(multi.hooks(owner()), &[recorder_addr(0)]);
}

#[test]
fn removal_swaps_last_into_place() {
    let log = journal();
    let mut multi = MultiHook::new(recorders(&log, &["a", "b", "c"]));
    for i in 0..3 {
        multi.add_hook(account(), recorder_addr(i)).unwrap();
    }

    multi.remove_hook(account(), recorder_addr(0)).unwrap();
    assert_eq!(multi.hooks(account()), &[recorder_addr(2), recorder_addr(1)]);
    assert_eq!(
        multi.remove_hook(account(), recorder_addr(0)),
        Err(GuardError::HookNotInstalled {
            hook: recorder_addr(0)
        })
    );
    assert_eq!(
        multi.remove_hook(owner(), recorder_addr(1)),
        Err(GuardError::HookNotInstalled {
            hook: recorder_addr(1)
        })
    );
    assert!(multi.events().contains(&GuardEvent::HookRemoved {
        account: account(),
        hook: recorder_addr(0)
    }));
}

#[test]
fn post_check_rejects_count_mismatch() {
    let host = MockHost::default();
    let log = journal();
    let mut multi = MultiHook::new(recorders(&log, &["a", "b", "c"]));
    multi.add_hook(account(), recorder_addr(0)).unwrap();
    multi.add_hook(account(), recorder_addr(1)).unwrap();

    let data = multi
        .pre_check(&host, account(), operator(), U256::ZERO, &[])
        .unwrap();
    multi.add_hook(account(), recorder_addr(2)).unwrap();

    assert_eq!(
        multi.post_check(&host, account(), &data),
        Err(GuardError::HookDataCountMismatch {
            expected: 3,
            actual: 2
        })
    );
    assert_eq!(
        multi.post_check(&host, account(), &[0x01, 0x02]),
        Err(GuardError::InvalidHookData)
    );
    assert!(!log.borrow().iter().any(|entry| entry.starts_with("post:")));
}

/// Timelock plus one recorder, addressed by fixed slots.
struct Stack {
    timelock: TimelockHook,
    recorder: Recorder,
}

impl HookResolver for Stack {
    fn resolve(&mut self, hook: Address) -> Option<&mut dyn Hook> {
        let unit: &mut dyn Hook = match hook {
            h if h == timelock_addr() => &mut self.timelock,
            h if h == recorder_addr(0) => &mut self.recorder,
            _ => return None,
        };
        Some(unit)
    }
}

fn timelock_addr() -> Address {
    addr(0x71)
}

#[test]
fn timelock_composes_with_other_hooks() -> eyre::Result<()> {
    let mut host = MockHost::default().with_owner(account(), owner());
    let log = journal();
    let mut timelock = TimelockHook::new();
    timelock.activate(account(), 3_600, 86_400)?;

    let mut multi = MultiHook::new(Stack {
        timelock,
        recorder: Recorder::new("p", &log),
    });
    multi.add_hook(account(), timelock_addr())?;
    multi.add_hook(account(), recorder_addr(0))?;

    let call = approve_call(5);
    let refused = multi.pre_check(&host, account(), operator(), U256::ZERO, &call);
    assert!(matches!(refused, Err(GuardError::NotQueued { .. })));
    assert!(log.borrow().is_empty());

    let data = multi.pre_check(&host, account(), owner(), U256::ZERO, &call)?;
    multi.post_check(&host, account(), &data)?;

    multi.units_mut().timelock.queue_operation(
        &host,
        operator(),
        account(),
        operator(),
        U256::ZERO,
        &call,
    )?;
    host.warp(3_600);
    let data = multi.pre_check(&host, account(), operator(), U256::ZERO, &call)?;
    multi.post_check(&host, account(), &data)?;

    assert_eq!(log.borrow().len(), 4);
    assert!(multi
        .units()
        .timelock
        .events()
        .iter()
        .any(|e| matches!(e, GuardEvent::OperationExecuted { .. })));
    Ok(())
}

#[test]
fn refusal_after_timelock_keeps_entry_live() -> eyre::Result<()> {
    let mut host = MockHost::default().with_owner(account(), owner());
    let log = journal();
    let mut timelock = TimelockHook::new();
    timelock.activate(account(), 3_600, 86_400)?;

    let mut refusing = Recorder::new("r", &log);
    refusing.refuse = true;
    let mut multi = MultiHook::new(Stack {
        timelock,
        recorder: refusing,
    });
    multi.add_hook(account(), timelock_addr())?;
    multi.add_hook(account(), recorder_addr(0))?;

    let call = approve_call(5);
    let hash = multi.units_mut().timelock.queue_operation(
        &host,
        operator(),
        account(),
        operator(),
        U256::ZERO,
        &call,
    )?;
    host.warp(3_600);

    assert_eq!(
        multi.pre_check(&host, account(), operator(), U256::ZERO, &call),
        Err(GuardError::InvalidHookData)
    );
    assert!(matches!(
        multi.units().timelock.operation_state(&host, account(), hash),
        OperationState::Ready { .. }
    ));
    assert!(!multi
        .units()
        .timelock
        .events()
        .iter()
        .any(|e| matches!(e, GuardEvent::OperationExecuted { .. })));

    multi.units_mut().recorder.refuse = false;
    let data = multi.pre_check(&host, account(), operator(), U256::ZERO, &call)?;
    multi.post_check(&host, account(), &data)?;
    assert_eq!(
        multi.units().timelock.operation_state(&host, account(), hash),
        OperationState::Consumed
    );
    assert!(matches!(
        multi.pre_check(&host, account(), operator(), U256::ZERO, &call),
        Err(GuardError::NotQueued { .. })
    ));
    Ok(())
}
