//! Row-level data access for the engine tables.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`]: pass the
//! `DatabaseConnection` for a standalone call, or an open
//! `DatabaseTransaction` to take part in an ambient atomic scope.

pub mod accounts;
pub mod categories;
pub mod category_links;
pub mod transactions;

pub use accounts::AccountFieldsPatch;
pub use transactions::{TransactionFieldsPatch, TransactionListFilter};
