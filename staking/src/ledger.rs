use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use vreg_directory::Contract;
use vreg_registry::{RegistryLogic, TransitionGuard, STAKING_BANK_NAME};
use vreg_store::RegistryStore;
use vreg_token::{ApprovalRecipient, FungibleToken};
use vreg_types::{Address, StakeAmount};

use crate::StakingError;

/// Token custody for verifiers, mirrored into the registry ledger.
///
/// Every path that moves tokens in or out also moves the registry balance,
/// and undoes the first half if the second half fails.
pub struct StakingLedger<S> {
    address: Address,
    owner: Address,
    registry: Arc<RegistryLogic<S>>,
    token: Arc<dyn FungibleToken>,
    stakes: Mutex<HashMap<Address, StakeAmount>>,
    busy: AtomicBool,
}

impl<S: RegistryStore> StakingLedger<S> {
    pub fn new(
        address: Address,
        owner: Address,
        registry: Arc<RegistryLogic<S>>,
        token: Arc<dyn FungibleToken>,
    ) -> Self {
        Self {
            address,
            owner,
            registry,
            token,
            stakes: Mutex::new(HashMap::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn token_address(&self) -> Address {
        self.token.address()
    }

    /// Stake this ledger has recorded for `verifier`.
    pub fn staked_balance(&self, verifier: &Address) -> StakeAmount {
        self.stakes().get(verifier).copied().unwrap_or(StakeAmount::ZERO)
    }

    pub fn total_staked(&self) -> StakeAmount {
        StakeAmount::new(
            self.stakes()
                .values()
                .fold(0u128, |total, s| total.saturating_add(s.raw())),
        )
    }

    /// Return `amount` of the caller's stake to the caller.
    ///
    /// The registry balance goes down first; if the token transfer then
    /// fails, it is put back.
    pub fn withdraw(&self, caller: &Address, amount: StakeAmount) -> Result<(), StakingError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        let staked = self.staked_balance(caller);
        let remaining = staked
            .checked_sub(amount)
            .ok_or(StakingError::InsufficientStake {
                needed: amount.raw(),
                available: staked.raw(),
            })?;

        self.registry
            .decrease_shard_balance(&self.address, caller, amount)?;
        if let Err(e) = self.token.transfer(&self.address, caller, amount) {
            warn!(verifier = %caller, amount = amount.raw(), error = %e, "withdrawal transfer failed, restoring stake");
            if let Err(restore) = self
                .registry
                .increase_shard_balance(&self.address, caller, amount)
            {
                error!(verifier = %caller, error = %restore, "failed to restore stake after withdrawal");
            }
            return Err(e.into());
        }

        self.record(caller, remaining);
        info!(verifier = %caller, amount = amount.raw(), remaining = remaining.raw(), "stake withdrawn");
        Ok(())
    }

    /// Administrative correction of a verifier's stake. No tokens move; the
    /// difference to the recorded stake is applied to the registry.
    pub fn set_balance(
        &self,
        caller: &Address,
        verifier: &Address,
        new_amount: StakeAmount,
    ) -> Result<(), StakingError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        if *caller != self.owner {
            return Err(StakingError::AccessDenied(caller.to_string()));
        }
        self.ensure_registered(verifier)?;

        let current = self.staked_balance(verifier);
        if let Some(delta) = new_amount.checked_sub(current) {
            if !delta.is_zero() {
                self.registry
                    .increase_shard_balance(&self.address, verifier, delta)?;
            }
        } else {
            let delta = current.saturating_sub(new_amount);
            self.registry
                .decrease_shard_balance(&self.address, verifier, delta)?;
        }

        self.record(verifier, new_amount);
        info!(verifier = %verifier, from = current.raw(), to = new_amount.raw(), "stake set");
        Ok(())
    }

    fn ensure_registered(&self, verifier: &Address) -> Result<(), StakingError> {
        if !self.registry.is_registered_verifier(verifier)? {
            return Err(StakingError::NotRegistered(verifier.to_string()));
        }
        Ok(())
    }

    fn stakes(&self) -> MutexGuard<'_, HashMap<Address, StakeAmount>> {
        self.stakes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, verifier: &Address, amount: StakeAmount) {
        let mut stakes = self.stakes();
        if amount.is_zero() {
            stakes.remove(verifier);
        } else {
            stakes.insert(*verifier, amount);
        }
    }
}

impl<S: RegistryStore> ApprovalRecipient for StakingLedger<S> {
    type Error = StakingError;

    /// Deposit notification from the token after `from` approved `amount`.
    ///
    /// Tokens are pulled only for registered verifiers. If the registry then
    /// refuses the increase, the pulled tokens are sent back.
    fn receive_approval(
        &self,
        caller: &Address,
        from: &Address,
        amount: StakeAmount,
        token: &Address,
        data: &[u8],
    ) -> Result<(), StakingError> {
        let _guard = TransitionGuard::enter(&self.busy)?;

        let expected = self.token.address();
        if *caller != expected || *token != expected {
            warn!(caller = %caller, token = %token, "deposit notification from unknown token rejected");
            return Err(StakingError::AccessDenied(caller.to_string()));
        }
        self.ensure_registered(from)?;
        debug!(verifier = %from, amount = amount.raw(), data_len = data.len(), "deposit received");

        self.token
            .transfer_from(&self.address, from, &self.address, amount)?;
        let staked = match self
            .registry
            .increase_shard_balance(&self.address, from, amount)
        {
            Ok(record) => record.balance,
            Err(e) => {
                warn!(verifier = %from, amount = amount.raw(), error = %e, "registry rejected deposit, refunding");
                if let Err(refund) = self.token.transfer(&self.address, from, amount) {
                    error!(verifier = %from, error = %refund, "deposit refund failed");
                }
                return Err(e.into());
            }
        };

        let recorded = self
            .staked_balance(from)
            .checked_add(amount)
            .unwrap_or(staked);
        self.record(from, recorded);
        info!(verifier = %from, amount = amount.raw(), staked = recorded.raw(), "stake deposited");
        Ok(())
    }
}

impl<S> Contract for StakingLedger<S> {
    fn address(&self) -> Address {
        self.address
    }

    fn contract_name(&self) -> &str {
        STAKING_BANK_NAME
    }
}
