//! The registry core.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use vreg_directory::{Contract, ContractLocator};
use vreg_store::{RegistryStore, StoreWrite, WriteBatch};
use vreg_types::{normalize_name, Address, ShardId, StakeAmount, Verifier};

use crate::event::{EventBus, RegistryEvent};
use crate::guard::TransitionGuard;
use crate::{RegistryError, REGISTRY_NAME, STAKING_BANK_NAME};

/// Registry business rules over an injected store and directory.
///
/// All operations take `&self`; the registry is shared (typically behind an
/// `Arc`) between direct callers and the staking ledger. Every mutating
/// operation holds the transition guard from its first read to its last
/// event, so operations never interleave.
pub struct RegistryLogic<S> {
    address: Address,
    owner: RwLock<Address>,
    store: Arc<S>,
    locator: Arc<dyn ContractLocator>,
    events: EventBus,
    busy: AtomicBool,
}

impl<S: RegistryStore> RegistryLogic<S> {
    pub(crate) fn from_parts(
        address: Address,
        owner: Address,
        store: Arc<S>,
        locator: Arc<dyn ContractLocator>,
        events: EventBus,
    ) -> Self {
        Self {
            address,
            owner: RwLock::new(owner),
            store,
            locator,
            events,
            busy: AtomicBool::new(false),
        }
    }

    /// The identity this logic instance writes to storage as.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The registry administrator.
    pub fn owner(&self) -> Address {
        match self.owner.read() {
            Ok(owner) => *owner,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RegistryEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Registration ────────────────────────────────────────────────────

    /// Register `caller` as a new verifier.
    ///
    /// The shard is `count / verifiers_per_shard` with the count taken before
    /// this insertion. The record starts active and enabled with no stake.
    pub fn create(&self, caller: &Address, name: &str, location: &str) -> Result<Verifier, RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        if self.store.is_registered(caller)? {
            return Err(RegistryError::DuplicateRegistration(caller.to_string()));
        }
        let normalized = normalize_name(name);
        if self.store.is_name_taken(&normalized)? {
            return Err(RegistryError::NameTaken(name.to_string()));
        }

        let count = self.store.address_count()?;
        let per_shard = self.store.verifiers_per_shard()?;
        if per_shard == 0 {
            return Err(RegistryError::InvalidShardSize(per_shard));
        }
        let verifier = Verifier::new(*caller, name, location, count / per_shard);

        let mut batch = WriteBatch::new();
        batch.push(StoreWrite::AppendAddress(*caller));
        batch.push(StoreWrite::PutVerifier(verifier.clone()));
        batch.push(StoreWrite::InsertName(normalized));
        self.store.commit(&self.address, batch)?;

        info!(verifier = %caller, verifier_name = name, shard = verifier.shard, "verifier registered");
        self.events.emit(&RegistryEvent::registered(&verifier));
        Ok(verifier)
    }

    /// Change the caller's name and location.
    ///
    /// A new name that only differs in case keeps the existing index entry;
    /// any other new name releases the old one.
    pub fn update(&self, caller: &Address, name: &str, location: &str) -> Result<Verifier, RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        let mut verifier = self.load(caller)?;
        let old_normalized = verifier.normalized_name();
        let new_normalized = normalize_name(name);

        let mut batch = WriteBatch::new();
        if new_normalized != old_normalized {
            if self.store.is_name_taken(&new_normalized)? {
                return Err(RegistryError::NameTaken(name.to_string()));
            }
            batch.push(StoreWrite::RemoveName(old_normalized));
            batch.push(StoreWrite::InsertName(new_normalized));
        }
        verifier.name = name.to_string();
        verifier.location = location.to_string();
        batch.push(StoreWrite::PutVerifier(verifier.clone()));
        self.store.commit(&self.address, batch)?;

        info!(verifier = %caller, verifier_name = name, location, "verifier updated");
        self.events.emit(&RegistryEvent::updated(&verifier));
        Ok(verifier)
    }

    // ── Status ──────────────────────────────────────────────────────────

    /// Set the self-controlled `active` flag. Only the verifier itself may
    /// call this.
    pub fn update_active_status(&self, caller: &Address, id: &Address, active: bool) -> Result<Verifier, RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        if caller != id {
            warn!(caller = %caller, verifier = %id, "active status change by non-verifier rejected");
            return Err(RegistryError::AccessDenied(caller.to_string()));
        }
        let before = self.load(id)?;
        let mut after = before.clone();
        after.active = active;

        let changed = self.commit_transition(&before, &after)?;
        if before.active != active {
            info!(verifier = %id, active, "active status changed");
        } else {
            debug!(verifier = %id, active, "active status unchanged");
        }
        self.events.emit(&RegistryEvent::ActiveStatusChanged {
            executor: *caller,
            verifier: *id,
            active,
        });
        self.emit_shard_change(changed);
        Ok(after)
    }

    /// Set the administrator-controlled `enabled` flag.
    pub fn update_enable_status(&self, caller: &Address, id: &Address, enable: bool) -> Result<Verifier, RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_admin(caller)?;
        let before = self.load(id)?;
        let mut after = before.clone();
        after.enabled = enable;

        let changed = self.commit_transition(&before, &after)?;
        if before.enabled != enable {
            info!(verifier = %id, enable, "enable status changed");
        } else {
            debug!(verifier = %id, enable, "enable status unchanged");
        }
        self.events.emit(&RegistryEvent::EnableStatusChanged {
            executor: *caller,
            verifier: *id,
            enable,
        });
        self.emit_shard_change(changed);
        Ok(after)
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Change the shard size for future registrations. Existing verifiers
    /// keep their shard.
    pub fn update_verifiers_per_shard(&self, caller: &Address, n: u64) -> Result<(), RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_admin(caller)?;
        if n == 0 {
            return Err(RegistryError::InvalidShardSize(n));
        }
        self.store.set_verifiers_per_shard(&self.address, n)?;
        info!(verifiers_per_shard = n, "shard size updated");
        Ok(())
    }

    pub fn update_token_address(&self, caller: &Address, token: &Address) -> Result<(), RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_admin(caller)?;
        self.store.set_token_address(&self.address, token)?;
        info!(token = %token, "token address updated");
        Ok(())
    }

    /// Hand the administrator role to `new_owner`.
    pub fn transfer_ownership(&self, caller: &Address, new_owner: &Address) -> Result<(), RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_admin(caller)?;
        if new_owner.is_zero() {
            return Err(RegistryError::InvalidOwner);
        }
        match self.owner.write() {
            Ok(mut owner) => *owner = *new_owner,
            Err(poisoned) => *poisoned.into_inner() = *new_owner,
        }
        info!(from = %caller, to = %new_owner, "registry ownership transferred");
        Ok(())
    }

    /// Pass the storage write capability to a replacement logic instance.
    ///
    /// After this call every write through `self` is denied by the store;
    /// the instance at `new_logic` takes over with [`crate::RegistryBuilder::attach`].
    pub fn hand_off_storage(&self, caller: &Address, new_logic: &Address) -> Result<(), RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_admin(caller)?;
        self.store.transfer_storage_owner(&self.address, new_logic)?;
        info!(from = %self.address, to = %new_logic, "storage handed off");
        Ok(())
    }

    // ── Balance ledger ──────────────────────────────────────────────────

    /// Add `amount` to a verifier's stake. Callable only by the address the
    /// directory currently binds to [`STAKING_BANK_NAME`].
    pub fn increase_shard_balance(
        &self,
        caller: &Address,
        id: &Address,
        amount: StakeAmount,
    ) -> Result<Verifier, RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_staking_bank(caller)?;
        let before = self.load(id)?;
        let mut after = before.clone();
        after.balance = before
            .balance
            .checked_add(amount)
            .ok_or(RegistryError::BalanceOverflow)?;

        let changed = self.commit_transition(&before, &after)?;
        info!(verifier = %id, amount = amount.raw(), balance = after.balance.raw(), "stake increased");
        self.emit_shard_change(changed);
        Ok(after)
    }

    /// Remove `amount` from a verifier's stake. Same authorization as
    /// [`RegistryLogic::increase_shard_balance`].
    pub fn decrease_shard_balance(
        &self,
        caller: &Address,
        id: &Address,
        amount: StakeAmount,
    ) -> Result<Verifier, RegistryError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        self.ensure_staking_bank(caller)?;
        let before = self.load(id)?;
        let mut after = before.clone();
        after.balance = before
            .balance
            .checked_sub(amount)
            .ok_or(RegistryError::InsufficientBalance {
                needed: amount.raw(),
                available: before.balance.raw(),
            })?;

        let changed = self.commit_transition(&before, &after)?;
        info!(verifier = %id, amount = amount.raw(), balance = after.balance.raw(), "stake decreased");
        self.emit_shard_change(changed);
        Ok(after)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn verifiers(&self, id: &Address) -> Result<Option<Verifier>, RegistryError> {
        Ok(self.store.verifier(id)?)
    }

    pub fn balances_per_shard(&self, shard: ShardId) -> Result<StakeAmount, RegistryError> {
        Ok(self.store.shard_balance(shard)?)
    }

    /// The id registered at position `index`.
    pub fn addresses(&self, index: u64) -> Result<Address, RegistryError> {
        self.store
            .address_at(index)?
            .ok_or_else(|| RegistryError::NotFound(format!("address index {index}")))
    }

    pub fn verifiers_per_shard(&self) -> Result<u64, RegistryError> {
        Ok(self.store.verifiers_per_shard()?)
    }

    pub fn token_address(&self) -> Result<Address, RegistryError> {
        Ok(self.store.token_address()?)
    }

    pub fn is_registered_verifier(&self, id: &Address) -> Result<bool, RegistryError> {
        Ok(self.store.is_registered(id)?)
    }

    pub fn number_of_verifiers(&self) -> Result<u64, RegistryError> {
        Ok(self.store.address_count()?)
    }

    /// Whether `id`'s balance currently counts toward its shard.
    pub fn is_visible(&self, id: &Address) -> Result<bool, RegistryError> {
        Ok(self.load(id)?.is_visible())
    }

    /// All verifiers in registration order.
    pub fn verifier_list(&self) -> Result<Vec<Verifier>, RegistryError> {
        self.store
            .addresses()?
            .iter()
            .map(|id| self.load(id))
            .collect()
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn load(&self, id: &Address) -> Result<Verifier, RegistryError> {
        self.store
            .verifier(id)?
            .ok_or_else(|| RegistryError::NotRegistered(id.to_string()))
    }

    fn ensure_admin(&self, caller: &Address) -> Result<(), RegistryError> {
        if *caller != self.owner() {
            warn!(caller = %caller, "admin operation by non-owner rejected");
            return Err(RegistryError::AccessDenied(caller.to_string()));
        }
        Ok(())
    }

    /// Resolved on every call so a directory rebind applies immediately.
    fn ensure_staking_bank(&self, caller: &Address) -> Result<(), RegistryError> {
        let bank = self.locator.contract_by_name(STAKING_BANK_NAME);
        if bank.is_zero() || bank != *caller {
            warn!(caller = %caller, bank = %bank, "balance mutation by non-staking-bank rejected");
            return Err(RegistryError::AccessDenied(caller.to_string()));
        }
        Ok(())
    }

    /// Stage `after` together with the shard aggregate adjustment implied by
    /// the change in visible balance, and commit both in one batch.
    ///
    /// Returns the new aggregate if it changed. A transition that changes
    /// nothing commits nothing.
    fn commit_transition(
        &self,
        before: &Verifier,
        after: &Verifier,
    ) -> Result<Option<(ShardId, StakeAmount)>, RegistryError> {
        debug_assert_eq!(before.shard, after.shard);
        let mut batch = WriteBatch::new();
        let old_visible = before.visible_balance();
        let new_visible = after.visible_balance();

        let mut changed = None;
        if old_visible != new_visible {
            let current = self.store.shard_balance(after.shard)?;
            let next = current
                .checked_sub(old_visible)
                .and_then(|rest| rest.checked_add(new_visible))
                .ok_or(RegistryError::BalanceOverflow)?;
            batch.push(StoreWrite::SetShardBalance {
                shard: after.shard,
                balance: next,
            });
            changed = Some((after.shard, next));
        }
        if before != after {
            batch.push(StoreWrite::PutVerifier(after.clone()));
        }
        if !batch.is_empty() {
            self.store.commit(&self.address, batch)?;
        }
        Ok(changed)
    }

    fn emit_shard_change(&self, changed: Option<(ShardId, StakeAmount)>) {
        if let Some((shard, new_balance)) = changed {
            debug!(shard, balance = new_balance.raw(), "shard balance changed");
            self.events
                .emit(&RegistryEvent::ShardBalanceChanged { shard, new_balance });
        }
    }
}

impl<S> Contract for RegistryLogic<S> {
    fn address(&self) -> Address {
        self.address
    }

    fn contract_name(&self) -> &str {
        REGISTRY_NAME
    }
}
