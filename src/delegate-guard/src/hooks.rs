//! Hook composition.
//!
//! A [`Hook`] is a two-phase check around one account call: `pre_check` decides whether the
//! call may run and returns opaque hook data, `post_check` receives that data back once the
//! call has executed. [`MultiHook`] runs an ordered per-account list of hooks as a single hook
//! so an account needs only one integration point.
//!
//! Hooks in a list are independent of each other. Removing one swaps the last hook into its
//! slot, so the relative order of the remaining hooks can change.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use delegate_guard_types::Host;

use crate::{
    errors::{GuardError, Result},
    events::{EventLog, GuardEvent},
    module::constants::{MAX_HOOKS, MODULE_TYPE_HOOK},
};

/// A two-phase check unit.
pub trait Hook {
    /// Inspect the account call `call_data` (carrying `value`) sent by `initiator`.
    ///
    /// Returns hook data to be handed back to [`Hook::post_check`].
    fn pre_check(
        &mut self,
        host: &dyn Host,
        account: Address,
        initiator: Address,
        value: U256,
        call_data: &[u8],
    ) -> Result<Bytes>;

    fn post_check(&mut self, host: &dyn Host, account: Address, hook_data: &[u8]) -> Result<()>;
}

/// Maps hook addresses to the units that implement them.
pub trait HookResolver {
    fn resolve(&mut self, hook: Address) -> Option<&mut dyn Hook>;
}

impl HookResolver for BTreeMap<Address, Box<dyn Hook>> {
    fn resolve(&mut self, hook: Address) -> Option<&mut dyn Hook> {
        let unit: &mut dyn Hook = self.get_mut(&hook)?.as_mut();
        Some(unit)
    }
}

/// Runs each account's hook list as one hook.
pub struct MultiHook<R> {
    units: R,
    hooks: BTreeMap<Address, Vec<Address>>,
    events: EventLog,
}

impl<R: HookResolver> MultiHook<R> {
    pub fn new(units: R) -> Self {
        Self {
            units,
            hooks: BTreeMap::new(),
            events: EventLog::default(),
        }
    }

    pub fn units(&self) -> &R {
        &self.units
    }

    pub fn units_mut(&mut self) -> &mut R {
        &mut self.units
    }

    pub fn is_module_type(&self, module_type_id: U256) -> bool {
        module_type_id == MODULE_TYPE_HOOK
    }

    /// Current hook list of `account`, in pre-check order.
    pub fn hooks(&self, account: Address) -> &[Address] {
        self.hooks.get(&account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_hook(&mut self, account: Address, hook: Address) -> Result<()> {
        if self.units.resolve(hook).is_none() {
            return Err(GuardError::UnknownHook { hook });
        }
        let list = self.hooks.entry(account).or_default();
        if list.contains(&hook) {
            return Err(GuardError::HookAlreadyInstalled { hook });
        }
        if list.len() >= MAX_HOOKS {
            return Err(GuardError::TooManyHooks { max: MAX_HOOKS });
        }
        list.push(hook);

        tracing::info!(%account, %hook, count = list.len(), "hook added");
        self.events.emit(GuardEvent::HookAdded { account, hook });
        Ok(())
    }

    /// Swap-with-last removal.
    pub fn remove_hook(&mut self, account: Address, hook: Address) -> Result<()> {
        let list = self
            .hooks
            .get_mut(&account)
            .ok_or(GuardError::HookNotInstalled { hook })?;
        let index = list
            .iter()
            .position(|h| *h == hook)
            .ok_or(GuardError::HookNotInstalled { hook })?;
        list.swap_remove(index);

        tracing::info!(%account, %hook, count = list.len(), "hook removed");
        self.events.emit(GuardEvent::HookRemoved { account, hook });
        Ok(())
    }

    pub fn events(&self) -> &[GuardEvent] {
        self.events.as_slice()
    }

    pub fn drain_events(&mut self) -> Vec<GuardEvent> {
        self.events.drain()
    }
}

impl<R: HookResolver> Hook for MultiHook<R> {
    fn pre_check(
        &mut self,
        host: &dyn Host,
        account: Address,
        initiator: Address,
        value: U256,
        call_data: &[u8],
    ) -> Result<Bytes> {
        // Snapshot: a unit must not be able to reshape the list mid-iteration.
        let hooks = self.hooks(account).to_vec();
        let mut hook_data = Vec::with_capacity(hooks.len());
        for hook in hooks {
            let unit = self
                .units
                .resolve(hook)
                .ok_or(GuardError::UnknownHook { hook })?;
            hook_data.push(unit.pre_check(host, account, initiator, value, call_data)?);
        }
        Ok(hook_data.abi_encode().into())
    }

    fn post_check(&mut self, host: &dyn Host, account: Address, hook_data: &[u8]) -> Result<()> {
        let hooks = self.hooks(account).to_vec();
        let per_hook =
            Vec::<Bytes>::abi_decode(hook_data, true).map_err(|_| GuardError::InvalidHookData)?;
        if per_hook.len() != hooks.len() {
            return Err(GuardError::HookDataCountMismatch {
                expected: hooks.len(),
                actual: per_hook.len(),
            });
        }
        for (hook, data) in hooks.iter().zip(per_hook.iter()).rev() {
            let unit = self
                .units
                .resolve(*hook)
                .ok_or(GuardError::UnknownHook { hook: *hook })?;
            unit.post_check(host, account, data)?;
        }
        Ok(())
    }
}
