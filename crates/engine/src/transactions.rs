//! Transaction primitives.
//!
//! A `Transaction` moves money into, out of, or between financial accounts.
//! Which accounts it touches is modeled as a [`TransactionTarget`]; storage
//! keeps the flat `from_account_id` / `to_account_id` nullable columns and the
//! target is rebuilt from them on every read.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidKind(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// The accounts a transaction references, tagged by kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionTarget {
    Income { to: Uuid },
    Expense { from: Uuid },
    Transfer { from: Uuid, to: Uuid },
}

impl TransactionTarget {
    /// Builds a transfer target, rejecting identical legs.
    pub fn transfer(from: Uuid, to: Uuid) -> ResultEngine<Self> {
        if from == to {
            return Err(EngineError::InvalidTransaction(
                "transfer source and destination must differ".to_string(),
            ));
        }
        Ok(Self::Transfer { from, to })
    }

    pub fn kind(self) -> TransactionKind {
        match self {
            Self::Income { .. } => TransactionKind::Income,
            Self::Expense { .. } => TransactionKind::Expense,
            Self::Transfer { .. } => TransactionKind::Transfer,
        }
    }

    pub fn from_account_id(self) -> Option<Uuid> {
        match self {
            Self::Income { .. } => None,
            Self::Expense { from } | Self::Transfer { from, .. } => Some(from),
        }
    }

    pub fn to_account_id(self) -> Option<Uuid> {
        match self {
            Self::Expense { .. } => None,
            Self::Income { to } | Self::Transfer { to, .. } => Some(to),
        }
    }

    /// Every account this target touches, source first.
    pub fn account_ids(self) -> Vec<Uuid> {
        self.from_account_id()
            .into_iter()
            .chain(self.to_account_id())
            .collect()
    }

    /// Rebuilds a target from a stored kind and its nullable references.
    pub fn from_refs(
        kind: TransactionKind,
        from: Option<Uuid>,
        to: Option<Uuid>,
    ) -> ResultEngine<Self> {
        match (kind, from, to) {
            (TransactionKind::Income, None, Some(to)) => Ok(Self::Income { to }),
            (TransactionKind::Expense, Some(from), None) => Ok(Self::Expense { from }),
            (TransactionKind::Transfer, Some(from), Some(to)) => Self::transfer(from, to),
            (TransactionKind::Income, ..) => Err(EngineError::InvalidTransaction(
                "income requires a destination account and no source account".to_string(),
            )),
            (TransactionKind::Expense, ..) => Err(EngineError::InvalidTransaction(
                "expense requires a source account and no destination account".to_string(),
            )),
            (TransactionKind::Transfer, ..) => Err(EngineError::InvalidTransaction(
                "transfer requires both a source and a destination account".to_string(),
            )),
        }
    }

    /// Derives the kind from which references are present: destination only
    /// is an income, source only an expense, both a transfer.
    pub fn infer(from: Option<Uuid>, to: Option<Uuid>) -> ResultEngine<Self> {
        match (from, to) {
            (None, Some(to)) => Ok(Self::Income { to }),
            (Some(from), None) => Ok(Self::Expense { from }),
            (Some(from), Some(to)) => Self::transfer(from, to),
            (None, None) => Err(EngineError::InvalidTransaction(
                "transaction references no account".to_string(),
            )),
        }
    }

    /// Replaces the given references, keeping the kind.
    ///
    /// A reference the kind does not carry (a source on an income, a
    /// destination on an expense) is rejected.
    pub fn with_refs(self, from: Option<Uuid>, to: Option<Uuid>) -> ResultEngine<Self> {
        match self {
            Self::Income { to: current } => {
                if from.is_some() {
                    return Err(EngineError::InvalidTransaction(
                        "income cannot have a source account".to_string(),
                    ));
                }
                Ok(Self::Income {
                    to: to.unwrap_or(current),
                })
            }
            Self::Expense { from: current } => {
                if to.is_some() {
                    return Err(EngineError::InvalidTransaction(
                        "expense cannot have a destination account".to_string(),
                    ));
                }
                Ok(Self::Expense {
                    from: from.unwrap_or(current),
                })
            }
            Self::Transfer {
                from: current_from,
                to: current_to,
            } => Self::transfer(from.unwrap_or(current_from), to.unwrap_or(current_to)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub target: TransactionTarget,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Linked category, if any. Filled from `transaction_category`.
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: String,
        target: TransactionTarget,
        amount_minor: i64,
        description: String,
        date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            target,
            amount_minor,
            description,
            date,
            category_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.target.kind()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub amount: i64,
    pub description: String,
    pub date: DateTimeUtc,
    pub from_account_id: Option<Uuid>,
    pub to_account_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::transaction_categories::Entity")]
    CategoryLink,
}

impl Related<super::transaction_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            kind: ActiveValue::Set(tx.kind().as_str().to_string()),
            amount: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            date: ActiveValue::Set(tx.date),
            from_account_id: ActiveValue::Set(tx.target.from_account_id()),
            to_account_id: ActiveValue::Set(tx.target.to_account_id()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind = TransactionKind::try_from(model.kind.as_str())?;
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            target: TransactionTarget::from_refs(
                kind,
                model.from_account_id,
                model.to_account_id,
            )?,
            amount_minor: model.amount,
            description: model.description,
            date: model.date,
            category_id: None,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_refs_enforces_reference_shape() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(
            TransactionTarget::from_refs(TransactionKind::Income, None, Some(a)).unwrap(),
            TransactionTarget::Income { to: a }
        );
        assert!(TransactionTarget::from_refs(TransactionKind::Income, Some(b), Some(a)).is_err());
        assert!(TransactionTarget::from_refs(TransactionKind::Expense, None, Some(a)).is_err());
        assert!(TransactionTarget::from_refs(TransactionKind::Transfer, Some(a), None).is_err());
        assert_eq!(
            TransactionTarget::from_refs(TransactionKind::Transfer, Some(a), Some(a)).unwrap_err(),
            EngineError::InvalidTransaction(
                "transfer source and destination must differ".to_string()
            )
        );
    }

    #[test]
    fn infer_derives_kind_from_present_references() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(
            TransactionTarget::infer(None, Some(a)).unwrap().kind(),
            TransactionKind::Income
        );
        assert_eq!(
            TransactionTarget::infer(Some(a), None).unwrap().kind(),
            TransactionKind::Expense
        );
        assert_eq!(
            TransactionTarget::infer(Some(a), Some(b)).unwrap().kind(),
            TransactionKind::Transfer
        );
        assert!(TransactionTarget::infer(None, None).is_err());
    }

    #[test]
    fn with_refs_keeps_kind_and_rejects_foreign_legs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let expense = TransactionTarget::Expense { from: a };
        assert_eq!(
            expense.with_refs(Some(b), None).unwrap(),
            TransactionTarget::Expense { from: b }
        );
        assert!(expense.with_refs(None, Some(b)).is_err());

        let transfer = TransactionTarget::Transfer { from: a, to: b };
        assert_eq!(
            transfer.with_refs(None, Some(c)).unwrap(),
            TransactionTarget::Transfer { from: a, to: c }
        );
        assert!(transfer.with_refs(Some(b), None).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let target = TransactionTarget::Income { to: Uuid::new_v4() };
        let now = Utc::now();
        assert!(Transaction::new("alice".into(), target, -1, String::new(), now, now).is_err());
        assert!(Transaction::new("alice".into(), target, 0, String::new(), now, now).is_ok());
    }
}
