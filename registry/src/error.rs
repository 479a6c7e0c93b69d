use thiserror::Error;
use vreg_store::StoreError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{0} is already registered")]
    DuplicateRegistration(String),

    #[error("name {0:?} is already taken")]
    NameTaken(String),

    #[error("{0} is not a registered verifier")]
    NotRegistered(String),

    #[error("access denied for {0}")]
    AccessDenied(String),

    #[error("verifiers per shard must be positive, got {0}")]
    InvalidShardSize(u64),

    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("storage owner is already initialized")]
    AlreadyInitialized,

    #[error("owner must not be the zero address")]
    InvalidOwner,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("re-entrant call into the registry")]
    ReentrantCall,

    #[error("balance overflow")]
    BalanceOverflow,

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AccessDenied(who) => RegistryError::AccessDenied(who),
            StoreError::AlreadyInitialized => RegistryError::AlreadyInitialized,
            StoreError::InvalidOwner => RegistryError::InvalidOwner,
            StoreError::NotFound(key) => RegistryError::NotFound(key),
            other => RegistryError::Store(other),
        }
    }
}
