use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    EngineError, FinancialAccount, NewAccountCmd, ResultEngine, UpdateAccountCmd,
    store::{self, AccountFieldsPatch},
    util::normalize_required_name,
    validation,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return an account, soft-deleted or not.
    pub async fn account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<FinancialAccount> {
        store::accounts::find_one(&self.database, account_id, user_id).await
    }

    /// Active accounts of the user.
    pub async fn accounts(&self, user_id: &str) -> ResultEngine<Vec<FinancialAccount>> {
        store::accounts::find_all(&self.database, user_id).await
    }

    /// Adds an account whose balance starts at its initial balance.
    pub async fn create_account(&self, cmd: NewAccountCmd) -> ResultEngine<FinancialAccount> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let account = FinancialAccount::new(
            cmd.user_id,
            name,
            cmd.kind,
            cmd.initial_balance_minor,
            Utc::now(),
        );
        let account = store::accounts::insert(&self.database, &account).await?;
        tracing::debug!(account_id = %account.id, "account created");
        Ok(account)
    }

    /// Renames, retypes, or moves the initial balance of an active account.
    ///
    /// The initial balance can only change while no transaction references
    /// the account; the running balance follows by the same difference.
    pub async fn update_account(&self, cmd: UpdateAccountCmd) -> ResultEngine<FinancialAccount> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "account"))
            .transpose()?;
        let user_id = cmd.user_id.as_str();
        with_tx!(self, |db_tx| {
            let current = validation::require_active_account(&db_tx, cmd.account_id, user_id).await?;

            let initial_balance_minor = cmd
                .initial_balance_minor
                .filter(|value| *value != current.initial_balance_minor);
            if initial_balance_minor.is_some() {
                validation::require_initial_balance_editable(&db_tx, cmd.account_id, user_id)
                    .await?;
            }

            let patch = AccountFieldsPatch {
                name,
                kind: cmd.kind,
                initial_balance_minor,
            };
            store::accounts::update(&db_tx, cmd.account_id, user_id, &patch).await?;
            if let Some(initial_balance_minor) = initial_balance_minor {
                let shift_minor = initial_balance_minor
                    .checked_sub(current.initial_balance_minor)
                    .ok_or_else(|| {
                        EngineError::InvalidAmount("initial balance out of range".to_string())
                    })?;
                store::accounts::increment_balance(&db_tx, cmd.account_id, user_id, shift_minor)
                    .await?;
            }
            store::accounts::find_one(&db_tx, cmd.account_id, user_id).await
        })
    }

    /// Soft-deletes an account. Its balance and transactions stay.
    pub async fn delete_account(
        &self,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<FinancialAccount> {
        store::accounts::soft_delete(&self.database, account_id, user_id).await
    }
}
