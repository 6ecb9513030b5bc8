use chrono::Utc;
use sea_orm::{DatabaseTransaction, TransactionTrait};
use uuid::Uuid;

use crate::{
    DeleteTransactionCmd, NewTransactionCmd, Patch, ResultEngine, Transaction,
    UpdateTransactionCmd, balance,
    store::{self, TransactionFieldsPatch, TransactionListFilter},
    validation,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a transaction with its category.
    pub async fn transaction(&self, transaction_id: Uuid, user_id: &str) -> ResultEngine<Transaction> {
        store::transactions::find_one(&self.database, transaction_id, user_id).await
    }

    /// Lists the user's transactions, newest first.
    pub async fn transactions(
        &self,
        user_id: &str,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        store::transactions::find_all(&self.database, user_id, filter).await
    }

    /// Records a transaction and moves the balances of its accounts.
    ///
    /// Every referenced account must belong to the user and be active. A
    /// category, when given, must be active and of the same kind.
    pub async fn create_transaction(&self, cmd: NewTransactionCmd) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            validation::require_non_negative_amount(cmd.amount_minor)?;
            validation::require_target_accounts(&db_tx, cmd.target, &cmd.user_id).await?;
            if let Some(category_id) = cmd.category_id {
                validation::require_linkable_category(
                    &db_tx,
                    category_id,
                    &cmd.user_id,
                    cmd.target.kind(),
                )
                .await?;
            }
            self.create_in(&db_tx, cmd).await
        })
    }

    /// Insert row, link, then `+amount` on the target. No account checks:
    /// the importer replays onto soft-deleted accounts through here.
    pub(super) async fn create_in(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: NewTransactionCmd,
    ) -> ResultEngine<Transaction> {
        validation::require_target_shape(cmd.target)?;
        let mut transaction = Transaction::new(
            cmd.user_id,
            cmd.target,
            cmd.amount_minor,
            cmd.description,
            cmd.date,
            Utc::now(),
        )?;

        store::transactions::insert(db_tx, &transaction).await?;
        if let Some(category_id) = cmd.category_id {
            store::category_links::create(db_tx, transaction.id, category_id).await?;
            transaction.category_id = Some(category_id);
        }
        balance::apply_delta(
            db_tx,
            &transaction.user_id,
            transaction.target,
            transaction.amount_minor,
        )
        .await?;

        tracing::debug!(
            transaction_id = %transaction.id,
            kind = transaction.kind().as_str(),
            amount_minor = transaction.amount_minor,
            "transaction created"
        );
        Ok(transaction)
    }

    /// Applies a partial update and reconciles the balances.
    ///
    /// - Amount only: the difference `new - old` is applied to the original
    ///   accounts.
    /// - Accounts changed: the original amount is reversed on the old
    ///   accounts and the new amount applied on the new ones.
    /// - Category only, description only, date only: no balance moves.
    ///
    /// The kind is fixed; a reference the kind does not carry is rejected.
    /// An empty command returns the stored transaction untouched.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let original =
                store::transactions::find_one(&db_tx, cmd.transaction_id, &cmd.user_id).await?;
            if cmd.is_empty() {
                Ok(original)
            } else {
                self.update_in(&db_tx, original, &cmd).await
            }
        })
    }

    async fn update_in(
        &self,
        db_tx: &DatabaseTransaction,
        original: Transaction,
        cmd: &UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let user_id = cmd.user_id.as_str();

        let amount_minor = cmd.amount_minor.unwrap_or(original.amount_minor);
        validation::require_non_negative_amount(amount_minor)?;

        let target = original
            .target
            .with_refs(cmd.from_account_id, cmd.to_account_id)?;
        let retargeted = target != original.target;
        if retargeted {
            let current = original.target.account_ids();
            for account_id in target.account_ids() {
                if !current.contains(&account_id) {
                    validation::require_active_account(db_tx, account_id, user_id).await?;
                }
            }
        }
        if let Patch::Set(category_id) = cmd.category_id {
            validation::require_linkable_category(db_tx, category_id, user_id, original.kind())
                .await?;
        }

        if cmd.touches_row() {
            let patch = TransactionFieldsPatch {
                amount_minor: cmd.amount_minor,
                description: cmd.description.clone(),
                date: cmd.date,
                target: retargeted.then_some(target),
            };
            store::transactions::update(db_tx, original.id, user_id, &patch).await?;
        }

        match cmd.category_id {
            Patch::Set(category_id) => {
                store::category_links::replace(db_tx, original.id, category_id).await?;
            }
            Patch::Clear => store::category_links::remove(db_tx, original.id).await?,
            Patch::Keep => {}
        }

        if retargeted {
            balance::apply_delta(db_tx, user_id, original.target, -original.amount_minor).await?;
            balance::apply_delta(db_tx, user_id, target, amount_minor).await?;
        } else if amount_minor != original.amount_minor {
            balance::apply_delta(
                db_tx,
                user_id,
                original.target,
                amount_minor - original.amount_minor,
            )
            .await?;
        }

        tracing::debug!(
            transaction_id = %original.id,
            retargeted,
            delta_minor = amount_minor - original.amount_minor,
            "transaction updated"
        );
        store::transactions::find_one(db_tx, original.id, user_id).await
    }

    /// Reverses the balance effect of a transaction, then removes it.
    pub async fn delete_transaction(&self, cmd: DeleteTransactionCmd) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let original =
                store::transactions::find_one(&db_tx, cmd.transaction_id, &cmd.user_id).await?;

            store::category_links::remove(&db_tx, original.id).await?;
            store::transactions::delete(&db_tx, original.id, &cmd.user_id).await?;
            balance::apply_delta(
                &db_tx,
                &cmd.user_id,
                original.target,
                -original.amount_minor,
            )
            .await?;

            tracing::debug!(transaction_id = %original.id, "transaction deleted");
            Ok(())
        })
    }
}
