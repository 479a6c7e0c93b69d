//! Nullable token: in-memory fungible token with approve-and-notify.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use vreg_token::{ApprovalRecipient, FungibleToken, TokenError};
use vreg_types::{Address, StakeAmount};

/// An in-memory token for testing the deposit and withdrawal paths.
///
/// Transfers can be made to fail on demand with [`NullToken::fail_transfers`].
pub struct NullToken {
    address: Address,
    balances: Mutex<HashMap<Address, u128>>,
    allowances: Mutex<HashMap<(Address, Address), u128>>,
    fail_transfers: AtomicBool,
}

impl NullToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: Mutex::new(HashMap::new()),
            allowances: Mutex::new(HashMap::new()),
            fail_transfers: AtomicBool::new(false),
        }
    }

    /// Credit `amount` to `to` out of thin air.
    pub fn mint(&self, to: &Address, amount: u128) {
        *self.balances.lock().unwrap().entry(*to).or_insert(0) += amount;
    }

    /// Set `spender`'s allowance over `caller`'s balance.
    pub fn approve(&self, caller: &Address, spender: &Address, amount: StakeAmount) {
        self.allowances
            .lock()
            .unwrap()
            .insert((*caller, *spender), amount.raw());
    }

    /// Approve `spender` and notify `recipient` in the same call.
    ///
    /// No lock is held while the recipient runs, so it may call back into
    /// the token.
    pub fn approve_and_call<R: ApprovalRecipient>(
        &self,
        caller: &Address,
        spender: &Address,
        recipient: &R,
        amount: StakeAmount,
        data: &[u8],
    ) -> Result<(), R::Error> {
        self.approve(caller, spender, amount);
        recipient.receive_approval(&self.address, caller, amount, &self.address, data)
    }

    /// Make every subsequent transfer fail (or succeed again).
    pub fn fail_transfers(&self, fail: bool) {
        self.fail_transfers.store(fail, Ordering::SeqCst);
    }

    fn move_balance(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        if self.fail_transfers.load(Ordering::SeqCst) {
            return Err(TokenError::Rejected("transfers disabled".into()));
        }
        let mut balances = self.balances.lock().unwrap();
        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        balances.insert(*from, available - amount);
        *balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }
}

impl FungibleToken for NullToken {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: &Address) -> StakeAmount {
        StakeAmount::new(self.balances.lock().unwrap().get(owner).copied().unwrap_or(0))
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> StakeAmount {
        StakeAmount::new(
            self.allowances
                .lock()
                .unwrap()
                .get(&(*owner, *spender))
                .copied()
                .unwrap_or(0),
        )
    }

    fn transfer(&self, caller: &Address, to: &Address, amount: StakeAmount) -> Result<(), TokenError> {
        self.move_balance(caller, to, amount.raw())
    }

    fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: StakeAmount,
    ) -> Result<(), TokenError> {
        let available = self.allowance(from, caller).raw();
        if available < amount.raw() {
            return Err(TokenError::InsufficientAllowance {
                needed: amount.raw(),
                available,
            });
        }
        self.move_balance(from, to, amount.raw())?;
        self.allowances
            .lock()
            .unwrap()
            .insert((*from, *caller), available - amount.raw());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> NullToken {
        NullToken::new(Address::repeat_byte(0x70))
    }

    #[test]
    fn transfer_moves_balance() {
        let t = token();
        let alice = Address::repeat_byte(1);
        let bob = Address::repeat_byte(2);
        t.mint(&alice, 100);
        t.transfer(&alice, &bob, StakeAmount::new(30)).unwrap();
        assert_eq!(t.balance_of(&alice), StakeAmount::new(70));
        assert_eq!(t.balance_of(&bob), StakeAmount::new(30));
    }

    #[test]
    fn transfer_rejects_overdraft() {
        let t = token();
        let alice = Address::repeat_byte(1);
        t.mint(&alice, 10);
        let err = t.transfer(&alice, &Address::repeat_byte(2), StakeAmount::new(11)).unwrap_err();
        assert_eq!(err, TokenError::InsufficientBalance { needed: 11, available: 10 });
        assert_eq!(t.balance_of(&alice), StakeAmount::new(10));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let t = token();
        let alice = Address::repeat_byte(1);
        let spender = Address::repeat_byte(3);
        t.mint(&alice, 100);
        t.approve(&alice, &spender, StakeAmount::new(60));

        t.transfer_from(&spender, &alice, &spender, StakeAmount::new(40)).unwrap();
        assert_eq!(t.allowance(&alice, &spender), StakeAmount::new(20));
        assert_eq!(t.balance_of(&spender), StakeAmount::new(40));

        let err = t
            .transfer_from(&spender, &alice, &spender, StakeAmount::new(21))
            .unwrap_err();
        assert_eq!(err, TokenError::InsufficientAllowance { needed: 21, available: 20 });
    }

    #[test]
    fn failing_transfers_leave_balances_alone() {
        let t = token();
        let alice = Address::repeat_byte(1);
        t.mint(&alice, 5);
        t.fail_transfers(true);
        assert!(t.transfer(&alice, &Address::repeat_byte(2), StakeAmount::new(1)).is_err());
        assert_eq!(t.balance_of(&alice), StakeAmount::new(5));
    }
}
