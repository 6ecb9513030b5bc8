use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::TransactionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{FinancialAccount, NewTransactionCmd, ResultEngine, snapshot::FinancerSnapshot, store};

use super::{Engine, with_tx};

/// What an import replaced and wrote.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub removed_accounts: u64,
    pub removed_transactions: u64,
    pub removed_categories: u64,
    pub accounts_created: usize,
    /// Of `accounts_created`, how many came in soft-deleted.
    pub accounts_deleted: usize,
    pub transactions_created: usize,
    /// Snapshot account id to the id of the created account, sorted by
    /// snapshot id.
    pub account_ids: BTreeMap<String, Uuid>,
}

impl Engine {
    /// Replaces all of the user's accounts, transactions and categories with
    /// the content of a Financer export.
    ///
    /// Accounts are created with the balance they must have had before the
    /// first transaction; transactions are then replayed in document order
    /// through the normal create path, so each account ends on the balance
    /// the export reports. Any failure leaves the user's previous data as it
    /// was.
    ///
    /// Authorization (administrators only) is up to the caller.
    pub async fn import_financer_snapshot(
        &self,
        user_id: &str,
        snapshot: &FinancerSnapshot,
    ) -> ResultEngine<ImportSummary> {
        let plan = snapshot.plan()?;
        with_tx!(self, |db_tx| {
            let mut summary = ImportSummary::default();

            store::category_links::remove_for_user(&db_tx, user_id).await?;
            summary.removed_categories =
                store::categories::delete_all_for_user(&db_tx, user_id).await?;
            summary.removed_transactions =
                store::transactions::delete_all_for_user(&db_tx, user_id).await?;
            summary.removed_accounts =
                store::accounts::delete_all_for_user(&db_tx, user_id).await?;

            let now = Utc::now();
            for planned in &plan.accounts {
                let account = FinancialAccount::with_id(
                    planned.id,
                    user_id.to_string(),
                    planned.name.clone(),
                    planned.kind,
                    planned.initial_balance_minor,
                    now,
                );
                store::accounts::insert(&db_tx, &account).await?;
                summary
                    .account_ids
                    .insert(planned.source_id.clone(), planned.id);
                summary.accounts_created += 1;
            }
            for planned in plan.accounts.iter().filter(|planned| planned.deleted) {
                store::accounts::soft_delete(&db_tx, planned.id, user_id).await?;
                summary.accounts_deleted += 1;
            }

            for planned in &plan.transactions {
                let cmd =
                    NewTransactionCmd::new(user_id, planned.target, planned.amount_minor, planned.date)
                        .description(planned.description.clone());
                self.create_in(&db_tx, cmd).await?;
                summary.transactions_created += 1;
            }

            tracing::info!(
                user_id,
                accounts = summary.accounts_created,
                transactions = summary.transactions_created,
                "financer snapshot imported"
            );
            Ok(summary)
        })
    }
}
