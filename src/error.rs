//! Typed failures of the query core.
//!
//! Lookups that simply find nothing return `None`; the variants here cover
//! caller mistakes the caller is expected to branch on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown schema '{0}'")]
    UnknownSchema(String),

    #[error("schema '{0}' registered more than once")]
    DuplicateSchema(String),

    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
