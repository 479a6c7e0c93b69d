use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("name {name} is already bound to {bound}")]
    NameCollision { name: String, bound: String },

    #[error("no directory entry for {0}")]
    NotFound(String),

    #[error("cannot bind {0} to the zero address")]
    InvalidAddress(String),
}
