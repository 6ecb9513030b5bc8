//! Financer export documents.
//!
//! A snapshot holds accounts with their *current* balance and the full list
//! of transactions. [`FinancerSnapshot::plan`] checks the document and turns
//! it into an [`ImportPlan`]: fresh account ids, reconstructed initial
//! balances and transactions retargeted to the new ids.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    AccountKind, EngineError, MoneyCents, ResultEngine, TransactionTarget, balance::net_effect,
};

/// A monetary value as exporters write it: a JSON number or a numeric
/// string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotAmount {
    Number(serde_json::Number),
    Text(String),
}

impl SnapshotAmount {
    /// Minor units, without going through floating point arithmetic.
    pub fn to_minor(&self) -> ResultEngine<i64> {
        let text = match self {
            Self::Number(number) => number.to_string(),
            Self::Text(text) => text.clone(),
        };
        text.parse::<MoneyCents>().map(MoneyCents::cents)
    }
}

impl From<i64> for SnapshotAmount {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for SnapshotAmount {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAccount {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Balance at export time.
    pub balance: SnapshotAmount,
    #[serde(rename = "isDeleted", default)]
    pub deleted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTransaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "fromAccount", default)]
    pub from_account: Option<String>,
    #[serde(rename = "toAccount", default)]
    pub to_account: Option<String>,
    pub amount: SnapshotAmount,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancerSnapshot {
    #[serde(default)]
    pub accounts: Vec<SnapshotAccount>,
    #[serde(default)]
    pub transactions: Vec<SnapshotTransaction>,
}

/// An account to create, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedAccount {
    pub id: Uuid,
    pub source_id: String,
    pub name: String,
    pub kind: AccountKind,
    /// `current balance - Σ net effect` of the document's transactions.
    pub initial_balance_minor: i64,
    pub deleted: bool,
}

/// A transaction to replay, in document order, already on the new ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedTransaction {
    pub source_id: String,
    pub target: TransactionTarget,
    pub amount_minor: i64,
    pub description: String,
    pub date: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub accounts: Vec<PlannedAccount>,
    pub transactions: Vec<PlannedTransaction>,
}

fn invalid(path: String, reason: impl std::fmt::Display) -> EngineError {
    EngineError::InvalidSnapshot(format!("{path}: {reason}"))
}

/// Maps Financer account types, and the engine's own names, to a kind.
fn parse_account_kind(value: &str) -> Option<AccountKind> {
    match value.trim().to_lowercase().as_str() {
        "savings" | "checking" | "bank" => Some(AccountKind::Bank),
        "cash" | "wallet" => Some(AccountKind::Wallet),
        "credit" | "credit_card" => Some(AccountKind::CreditCard),
        "investment" => Some(AccountKind::Investment),
        "loan" => Some(AccountKind::Loan),
        _ => None,
    }
}

impl FinancerSnapshot {
    pub fn from_json(input: &str) -> ResultEngine<Self> {
        serde_json::from_str(input)
            .map_err(|err| EngineError::InvalidSnapshot(format!("malformed document: {err}")))
    }

    /// Checks the document without building anything.
    pub fn validate(&self) -> ResultEngine<()> {
        self.plan().map(|_| ())
    }

    /// Checks the document and computes what the import will write.
    pub fn plan(&self) -> ResultEngine<ImportPlan> {
        let mut new_ids: HashMap<&str, Uuid> = HashMap::with_capacity(self.accounts.len());
        let mut accounts = Vec::with_capacity(self.accounts.len());
        let mut current_balances = Vec::with_capacity(self.accounts.len());

        for (index, account) in self.accounts.iter().enumerate() {
            let path = format!("accounts[{index}]");
            if account.id.trim().is_empty() {
                return Err(invalid(format!("{path}._id"), "must not be empty"));
            }
            if new_ids.contains_key(account.id.as_str()) {
                return Err(invalid(
                    format!("{path}._id"),
                    format!("duplicate account id {:?}", account.id),
                ));
            }
            let name = account.name.trim();
            if name.is_empty() {
                return Err(invalid(format!("{path}.name"), "must not be empty"));
            }
            let kind = parse_account_kind(&account.kind).ok_or_else(|| {
                invalid(
                    format!("{path}.type"),
                    format!("unknown account type {:?}", account.kind),
                )
            })?;
            let balance = account
                .balance
                .to_minor()
                .map_err(|err| invalid(format!("{path}.balance"), amount_reason(err)))?;

            let id = Uuid::new_v4();
            new_ids.insert(account.id.as_str(), id);
            current_balances.push(balance);
            accounts.push(PlannedAccount {
                id,
                source_id: account.id.clone(),
                name: name.to_string(),
                kind,
                initial_balance_minor: balance,
                deleted: account.deleted,
            });
        }

        let resolve = |path: String, reference: &Option<String>| -> ResultEngine<Option<Uuid>> {
            match reference.as_deref() {
                None => Ok(None),
                Some(source_id) => new_ids.get(source_id).copied().map(Some).ok_or_else(|| {
                    invalid(path, format!("unknown account {source_id:?}"))
                }),
            }
        };

        let mut seen_transactions: HashSet<&str> = HashSet::with_capacity(self.transactions.len());
        let mut transactions = Vec::with_capacity(self.transactions.len());
        for (index, tx) in self.transactions.iter().enumerate() {
            let path = format!("transactions[{index}]");
            if !seen_transactions.insert(tx.id.as_str()) {
                return Err(invalid(
                    format!("{path}._id"),
                    format!("duplicate transaction id {:?}", tx.id),
                ));
            }
            let from = resolve(format!("{path}.fromAccount"), &tx.from_account)?;
            let to = resolve(format!("{path}.toAccount"), &tx.to_account)?;
            let target = TransactionTarget::infer(from, to).map_err(|err| {
                invalid(path.clone(), match err {
                    EngineError::InvalidTransaction(reason) => reason,
                    other => other.to_string(),
                })
            })?;
            let amount_minor = tx
                .amount
                .to_minor()
                .map_err(|err| invalid(format!("{path}.amount"), amount_reason(err)))?;
            if amount_minor < 0 {
                return Err(invalid(format!("{path}.amount"), "must not be negative"));
            }
            transactions.push(PlannedTransaction {
                source_id: tx.id.clone(),
                target,
                amount_minor,
                description: tx.description.trim().to_string(),
                date: tx.date,
            });
        }

        let mut effects: HashMap<Uuid, i64> = HashMap::with_capacity(accounts.len());
        for tx in &transactions {
            for account_id in tx.target.account_ids() {
                let total = effects.entry(account_id).or_default();
                *total = total
                    .checked_add(net_effect(tx.target, tx.amount_minor, account_id))
                    .ok_or_else(|| overflow(&accounts, account_id))?;
            }
        }

        for (account, current) in accounts.iter_mut().zip(current_balances) {
            let total = effects.get(&account.id).copied().unwrap_or(0);
            account.initial_balance_minor = current.checked_sub(total).ok_or_else(|| {
                invalid(format!("account {:?}", account.source_id), "overflow")
            })?;
        }

        Ok(ImportPlan {
            accounts,
            transactions,
        })
    }
}

fn overflow(accounts: &[PlannedAccount], account_id: Uuid) -> EngineError {
    let source_id = accounts
        .iter()
        .find(|account| account.id == account_id)
        .map_or("?", |account| account.source_id.as_str());
    invalid(format!("account {source_id:?}"), "overflow")
}

fn amount_reason(err: EngineError) -> String {
    match err {
        EngineError::InvalidAmount(reason) => reason,
        other => other.to_string(),
    }
}
