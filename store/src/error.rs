use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("caller {0} is not the storage owner")]
    AccessDenied(String),

    #[error("storage owner is already initialized")]
    AlreadyInitialized,

    #[error("storage owner must not be the zero address")]
    InvalidOwner,

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}
