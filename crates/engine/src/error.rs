//! The module contains the error the engine can throw.
//!
//! Every fallible engine operation returns [`EngineError`]. The variants that
//! matter most to callers are:
//!
//! - [`KeyNotFound`] thrown when an account, transaction or category does not
//!   exist for the requesting user.
//! - [`Conflict`] thrown when a change is refused because other rows already
//!   depend on the current value.
//! - [`Database`] thrown when the persistence layer fails; the enclosing
//!   atomic scope is rolled back.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`Conflict`]: EngineError::Conflict
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid kind: {0}")]
    InvalidKind(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Category mismatch: {0}")]
    CategoryMismatch(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidKind(a), Self::InvalidKind(b)) => a == b,
            (Self::InvalidTransaction(a), Self::InvalidTransaction(b)) => a == b,
            (Self::CategoryMismatch(a), Self::CategoryMismatch(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::InvalidSnapshot(a), Self::InvalidSnapshot(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
