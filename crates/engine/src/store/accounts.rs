use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{AccountKind, EngineError, FinancialAccount, ResultEngine, accounts};

/// Column changes for [`update`]. `None` leaves the column alone.
///
/// `initial_balance_minor` only rewrites the initial balance column; moving
/// the running balance is the caller's job (see [`increment_balance`]).
#[derive(Clone, Debug, Default)]
pub struct AccountFieldsPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub initial_balance_minor: Option<i64>,
}

impl AccountFieldsPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.kind.is_none() && self.initial_balance_minor.is_none()
    }
}

fn not_found() -> EngineError {
    EngineError::KeyNotFound("account not exists".to_string())
}

fn out_of_range() -> EngineError {
    EngineError::InvalidAmount("balance out of range".to_string())
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    account: &FinancialAccount,
) -> ResultEngine<FinancialAccount> {
    let model: accounts::ActiveModel = account.into();
    let model = model.insert(db).await?;
    FinancialAccount::try_from(model)
}

/// Finds an account owned by `user_id`, soft-deleted ones included.
pub async fn find_one<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
) -> ResultEngine<FinancialAccount> {
    let model = accounts::Entity::find_by_id(account_id)
        .filter(accounts::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    FinancialAccount::try_from(model)
}

/// Active accounts of a user, oldest first.
pub async fn find_all<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<FinancialAccount>> {
    accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(user_id))
        .filter(accounts::Column::Deleted.eq(false))
        .order_by_asc(accounts::Column::CreatedAt)
        .order_by_asc(accounts::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(FinancialAccount::try_from)
        .collect()
}

/// Every account of a user, soft-deleted ones included.
pub async fn find_all_with_deleted<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<FinancialAccount>> {
    accounts::Entity::find()
        .filter(accounts::Column::UserId.eq(user_id))
        .order_by_asc(accounts::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(FinancialAccount::try_from)
        .collect()
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
    patch: &AccountFieldsPatch,
) -> ResultEngine<FinancialAccount> {
    if patch.is_empty() {
        return find_one(db, account_id, user_id).await;
    }

    let mut query = accounts::Entity::update_many()
        .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()));
    if let Some(name) = &patch.name {
        query = query.col_expr(accounts::Column::Name, Expr::value(name.clone()));
    }
    if let Some(kind) = patch.kind {
        query = query.col_expr(accounts::Column::Kind, Expr::value(kind.as_str()));
    }
    if let Some(initial_balance_minor) = patch.initial_balance_minor {
        query = query.col_expr(
            accounts::Column::InitialBalance,
            Expr::value(initial_balance_minor),
        );
    }
    let result = query
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    find_one(db, account_id, user_id).await
}

/// Flags the account as deleted. The balance is left as is.
pub async fn soft_delete<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
) -> ResultEngine<FinancialAccount> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::Deleted, Expr::value(true))
        .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    find_one(db, account_id, user_id).await
}

/// `balance = balance + amount_minor`, evaluated by the database.
///
/// Does not look at the soft-delete flag. A result outside `i64` is refused
/// with `InvalidAmount` before the row is touched; SQLite would otherwise
/// store it as a REAL.
pub async fn increment_balance<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
    amount_minor: i64,
) -> ResultEngine<()> {
    let current = find_one(db, account_id, user_id).await?;
    current
        .balance_minor
        .checked_add(amount_minor)
        .ok_or_else(out_of_range)?;

    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).add(amount_minor),
        )
        .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(())
}

/// `balance = balance - amount_minor`, evaluated by the database.
///
/// Same range check as [`increment_balance`].
pub async fn decrement_balance<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
    amount_minor: i64,
) -> ResultEngine<()> {
    let current = find_one(db, account_id, user_id).await?;
    current
        .balance_minor
        .checked_sub(amount_minor)
        .ok_or_else(out_of_range)?;

    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::Balance,
            Expr::col(accounts::Column::Balance).sub(amount_minor),
        )
        .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(())
}

/// Physically removes every account of a user. Returns the number of rows.
pub async fn delete_all_for_user<C: ConnectionTrait>(db: &C, user_id: &str) -> ResultEngine<u64> {
    let result = accounts::Entity::delete_many()
        .filter(accounts::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
