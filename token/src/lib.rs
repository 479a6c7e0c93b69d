//! Fungible-token boundary.
//!
//! The stake token is an external collaborator. The registry side only needs
//! two capabilities from it: moving balances (`transfer`, `transfer_from`)
//! and querying them. Deposits use the approve-and-notify pattern: the token
//! records an allowance and then calls [`ApprovalRecipient::receive_approval`]
//! on the spender in the same transition.

pub mod error;

pub use error::TokenError;

use vreg_types::{Address, StakeAmount};

/// The capabilities the staking ledger consumes from the stake token.
pub trait FungibleToken: Send + Sync {
    /// The token's own address.
    fn address(&self) -> Address;

    fn balance_of(&self, owner: &Address) -> StakeAmount;

    fn allowance(&self, owner: &Address, spender: &Address) -> StakeAmount;

    /// Move `amount` from `caller` to `to`.
    fn transfer(&self, caller: &Address, to: &Address, amount: StakeAmount) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`, spending `caller`'s allowance.
    fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: StakeAmount,
    ) -> Result<(), TokenError>;
}

/// A contract notified by the token after an approval.
pub trait ApprovalRecipient {
    type Error: From<TokenError>;

    /// Called by the token (`caller`) once `from` approved `amount` for the
    /// recipient.
    fn receive_approval(
        &self,
        caller: &Address,
        from: &Address,
        amount: StakeAmount,
        token: &Address,
        data: &[u8],
    ) -> Result<(), Self::Error>;
}
