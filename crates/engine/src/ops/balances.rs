use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, FinancialAccount, ResultEngine, balance::net_effect, store};

use super::{Engine, with_tx};

/// An account whose cached balance disagrees with its ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceDiscrepancy {
    pub account_id: Uuid,
    pub name: String,
    pub stored_minor: i64,
    /// `initial_balance + Σ net effect` of its transactions.
    pub expected_minor: i64,
}

impl BalanceDiscrepancy {
    /// `stored - expected`, saturating at the `i64` bounds.
    pub fn drift_minor(&self) -> i64 {
        self.stored_minor.saturating_sub(self.expected_minor)
    }
}

fn overflow(account_id: Uuid) -> EngineError {
    EngineError::InvalidAmount(format!("balance of account {account_id} out of range"))
}

/// Running balance of an account right after one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    pub date: DateTime<Utc>,
    pub transaction_id: Uuid,
    pub balance_minor: i64,
}

/// Replays the user's ledger and returns every mismatching account,
/// soft-deleted ones included.
async fn discrepancies<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<BalanceDiscrepancy>> {
    let accounts: Vec<FinancialAccount> =
        store::accounts::find_all_with_deleted(db, user_id).await?;
    let mut expected: HashMap<Uuid, i64> = accounts
        .iter()
        .map(|account| (account.id, account.initial_balance_minor))
        .collect();

    for transaction in store::transactions::find_all_for_user(db, user_id).await? {
        for account_id in transaction.target.account_ids() {
            if let Some(total) = expected.get_mut(&account_id) {
                *total = total
                    .checked_add(net_effect(
                        transaction.target,
                        transaction.amount_minor,
                        account_id,
                    ))
                    .ok_or_else(|| overflow(account_id))?;
            }
        }
    }

    Ok(accounts
        .into_iter()
        .filter_map(|account| {
            let expected_minor = expected
                .get(&account.id)
                .copied()
                .unwrap_or(account.initial_balance_minor);
            (expected_minor != account.balance_minor).then(|| BalanceDiscrepancy {
                account_id: account.id,
                name: account.name,
                stored_minor: account.balance_minor,
                expected_minor,
            })
        })
        .collect())
}

impl Engine {
    /// Accounts whose balance no longer equals initial balance plus the
    /// effect of their transactions. Empty when everything is consistent.
    pub async fn verify_balances(&self, user_id: &str) -> ResultEngine<Vec<BalanceDiscrepancy>> {
        let found = discrepancies(&self.database, user_id).await?;
        for item in &found {
            tracing::warn!(
                account_id = %item.account_id,
                stored_minor = item.stored_minor,
                expected_minor = item.expected_minor,
                "balance discrepancy"
            );
        }
        Ok(found)
    }

    /// Brings every drifted balance back to its ledger value and returns how
    /// many accounts changed.
    ///
    /// Each fix is a relative update by the drift, inside one DB transaction.
    pub async fn recompute_balances(&self, user_id: &str) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let found = discrepancies(&db_tx, user_id).await?;
            for item in &found {
                let drift_minor = item
                    .stored_minor
                    .checked_sub(item.expected_minor)
                    .ok_or_else(|| overflow(item.account_id))?;
                store::accounts::decrement_balance(&db_tx, item.account_id, user_id, drift_minor)
                    .await?;
            }
            tracing::info!(user_id, fixed = found.len(), "balances recomputed");
            Ok(found.len())
        })
    }

    /// Balance of an account after each of its transactions, oldest first,
    /// starting from its initial balance.
    pub async fn balance_history(
        &self,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<BalancePoint>> {
        let account = store::accounts::find_one(&self.database, account_id, user_id).await?;
        let transactions =
            store::transactions::find_all_for_account(&self.database, account_id, user_id).await?;

        let mut running = account.initial_balance_minor;
        transactions
            .into_iter()
            .map(|transaction| {
                running = running
                    .checked_add(net_effect(
                        transaction.target,
                        transaction.amount_minor,
                        account_id,
                    ))
                    .ok_or_else(|| overflow(account_id))?;
                Ok(BalancePoint {
                    date: transaction.date,
                    transaction_id: transaction.id,
                    balance_minor: running,
                })
            })
            .collect()
    }
}
