//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (create/update/delete of transactions, accounts and categories), keeping
//! call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, TransactionKind, TransactionTarget};

/// A field of a partial update that can be left alone, cleared, or set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Create a transaction.
#[derive(Clone, Debug)]
pub struct NewTransactionCmd {
    pub user_id: String,
    pub target: TransactionTarget,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
}

impl NewTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        target: TransactionTarget,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            target,
            amount_minor,
            description: String::new(),
            date,
            category_id: None,
        }
    }

    #[must_use]
    pub fn income(
        user_id: impl Into<String>,
        to_account_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            TransactionTarget::Income { to: to_account_id },
            amount_minor,
            date,
        )
    }

    #[must_use]
    pub fn expense(
        user_id: impl Into<String>,
        from_account_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            TransactionTarget::Expense {
                from: from_account_id,
            },
            amount_minor,
            date,
        )
    }

    /// Identical legs are not rejected here; the engine refuses them on
    /// create.
    #[must_use]
    pub fn transfer(
        user_id: impl Into<String>,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_minor: i64,
        date: DateTime<Utc>,
    ) -> Self {
        Self::new(
            user_id,
            TransactionTarget::Transfer {
                from: from_account_id,
                to: to_account_id,
            },
            amount_minor,
            date,
        )
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Partially update a transaction. Unset fields are left untouched; the kind
/// can never change.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub category_id: Patch<Uuid>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
            amount_minor: None,
            description: None,
            date: None,
            from_account_id: None,
            to_account_id: None,
            category_id: Patch::Keep,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn from_account_id(mut self, account_id: Uuid) -> Self {
        self.from_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn to_account_id(mut self, account_id: Uuid) -> Self {
        self.to_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Patch::Set(category_id);
        self
    }

    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.category_id = Patch::Clear;
        self
    }

    /// Whether any column of the transaction row itself is patched.
    pub fn touches_row(&self) -> bool {
        self.amount_minor.is_some()
            || self.description.is_some()
            || self.date.is_some()
            || self.from_account_id.is_some()
            || self.to_account_id.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_row() && self.category_id.is_keep()
    }
}

/// Delete a transaction, reversing its balance effect.
#[derive(Clone, Debug)]
pub struct DeleteTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
}

impl DeleteTransactionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
        }
    }
}

/// Create a financial account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance_minor: i64,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            kind,
            initial_balance_minor: 0,
        }
    }

    #[must_use]
    pub fn initial_balance_minor(mut self, initial_balance_minor: i64) -> Self {
        self.initial_balance_minor = initial_balance_minor;
        self
    }
}

/// Update a financial account.
#[derive(Clone, Debug)]
pub struct UpdateAccountCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub initial_balance_minor: Option<i64>,
}

impl UpdateAccountCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, account_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            account_id,
            name: None,
            kind: None,
            initial_balance_minor: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: AccountKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn initial_balance_minor(mut self, initial_balance_minor: i64) -> Self {
        self.initial_balance_minor = Some(initial_balance_minor);
        self
    }
}

/// Update a category.
#[derive(Clone, Debug)]
pub struct UpdateCategoryCmd {
    pub user_id: String,
    pub category_id: Uuid,
    pub name: Option<String>,
    pub kind: Option<TransactionKind>,
}

impl UpdateCategoryCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, category_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            category_id,
            name: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }
}
