use thiserror::Error;
use vreg_registry::RegistryError;
use vreg_token::TokenError;

#[derive(Debug, Error)]
pub enum StakingError {
    #[error("access denied for {0}")]
    AccessDenied(String),

    #[error("{0} is not a registered verifier")]
    NotRegistered(String),

    #[error("insufficient stake: need {needed}, have {available}")]
    InsufficientStake { needed: u128, available: u128 },

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),
}
