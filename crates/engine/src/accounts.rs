//! The module contains `FinancialAccount` and its table.
//!
//! An account carries two balances:
//! - `initial_balance_minor`, fixed when the account is created
//! - `balance_minor`, the cached running balance, only ever moved by relative
//!   updates issued by the balance engine

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Bank,
    CreditCard,
    Wallet,
    Investment,
    Loan,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::CreditCard => "credit_card",
            Self::Wallet => "wallet",
            Self::Investment => "investment",
            Self::Loan => "loan",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "bank" => Ok(Self::Bank),
            "credit_card" => Ok(Self::CreditCard),
            "wallet" => Ok(Self::Wallet),
            "investment" => Ok(Self::Investment),
            "loan" => Ok(Self::Loan),
            other => Err(EngineError::InvalidKind(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

/// A financial account (bank account, wallet, credit card, ...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialAccount {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub initial_balance_minor: i64,
    pub balance_minor: i64,
    /// Soft-delete flag. Deleted accounts keep their balance.
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialAccount {
    /// A fresh account whose running balance starts at its initial balance.
    pub fn new(
        user_id: String,
        name: String,
        kind: AccountKind,
        initial_balance_minor: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, name, kind, initial_balance_minor, now)
    }

    pub fn with_id(
        id: Uuid,
        user_id: String,
        name: String,
        kind: AccountKind,
        initial_balance_minor: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            kind,
            initial_balance_minor,
            balance_minor: initial_balance_minor,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "financial_account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub initial_balance: i64,
    pub balance: i64,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&FinancialAccount> for ActiveModel {
    fn from(value: &FinancialAccount) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            initial_balance: ActiveValue::Set(value.initial_balance_minor),
            balance: ActiveValue::Set(value.balance_minor),
            deleted: ActiveValue::Set(value.deleted),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for FinancialAccount {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: AccountKind::try_from(model.kind.as_str())?,
            initial_balance_minor: model.initial_balance,
            balance_minor: model.balance,
            deleted: model.deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_starts_at_initial_balance() {
        let account = FinancialAccount::new(
            "alice".to_string(),
            "Checking".to_string(),
            AccountKind::Bank,
            -2500,
            Utc::now(),
        );
        assert_eq!(account.balance_minor, -2500);
        assert_eq!(account.initial_balance_minor, -2500);
        assert!(!account.deleted);
    }

    #[test]
    fn kind_round_trips_through_storage_name() {
        for kind in [
            AccountKind::Bank,
            AccountKind::CreditCard,
            AccountKind::Wallet,
            AccountKind::Investment,
            AccountKind::Loan,
        ] {
            assert_eq!(AccountKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(AccountKind::try_from("savings").is_err());
    }
}
