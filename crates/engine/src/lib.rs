pub use accounts::{AccountKind, FinancialAccount};
pub use balance::{BalanceLeg, LegSide, apply_delta, balance_legs, net_effect};
pub use categories::Category;
pub use commands::{
    DeleteTransactionCmd, NewAccountCmd, NewTransactionCmd, Patch, UpdateAccountCmd,
    UpdateCategoryCmd, UpdateTransactionCmd,
};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{BalanceDiscrepancy, BalancePoint, Engine, EngineBuilder, ImportSummary};
pub use snapshot::{
    FinancerSnapshot, ImportPlan, PlannedAccount, PlannedTransaction, SnapshotAccount,
    SnapshotAmount, SnapshotTransaction,
};
pub use store::TransactionListFilter;
pub use transactions::{Transaction, TransactionKind, TransactionTarget};

mod accounts;
mod balance;
mod categories;
mod commands;
mod error;
mod money;
mod ops;
mod snapshot;
pub mod store;
mod transaction_categories;
mod transactions;
mod util;
mod validation;

type ResultEngine<T> = Result<T, EngineError>;
