use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionTarget, transaction_categories,
    transactions,
};

/// Filters for listing transactions.
///
/// `month` narrows inside `year` and is rejected on its own. Both are
/// calendar periods in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub year: Option<i32>,
    /// 1..=12
    pub month: Option<u32>,
    /// Matches either leg.
    pub account_id: Option<Uuid>,
    pub limit: Option<u64>,
}

impl TransactionListFilter {
    #[must_use]
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    #[must_use]
    pub fn account_id(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The `[from, to)` window selected by `year`/`month`, if any.
    pub fn date_range(&self) -> ResultEngine<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let year = match (self.year, self.month) {
            (None, None) => return Ok(None),
            (None, Some(_)) => {
                return Err(EngineError::InvalidFilter(
                    "month requires a year".to_string(),
                ));
            }
            (Some(year), _) => year,
        };

        let (from, to) = match self.month {
            None => (month_start(year, 1)?, month_start(year + 1, 1)?),
            Some(month @ 1..=11) => (month_start(year, month)?, month_start(year, month + 1)?),
            Some(12) => (month_start(year, 12)?, month_start(year + 1, 1)?),
            Some(month) => {
                return Err(EngineError::InvalidFilter(format!(
                    "month must be in 1..=12, got {month}"
                )));
            }
        };
        Ok(Some((from, to)))
    }
}

fn month_start(year: i32, month: u32) -> ResultEngine<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
        .ok_or_else(|| EngineError::InvalidFilter(format!("year out of range: {year}")))
}

/// Column changes for [`update`]. `None` leaves the column alone.
///
/// `target` rewrites both account reference columns; the kind column is
/// never touched.
#[derive(Clone, Debug, Default)]
pub struct TransactionFieldsPatch {
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub target: Option<TransactionTarget>,
}

impl TransactionFieldsPatch {
    pub fn is_empty(&self) -> bool {
        self.amount_minor.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.target.is_none()
    }
}

fn not_found() -> EngineError {
    EngineError::KeyNotFound("transaction not exists".to_string())
}

fn with_link(
    (model, link): (transactions::Model, Option<transaction_categories::Model>),
) -> ResultEngine<Transaction> {
    let mut transaction = Transaction::try_from(model)?;
    transaction.category_id = link.map(|link| link.category_id);
    Ok(transaction)
}

/// Inserts the row only; the category link is stored separately.
pub async fn insert<C: ConnectionTrait>(db: &C, transaction: &Transaction) -> ResultEngine<()> {
    let model: transactions::ActiveModel = transaction.into();
    transactions::Entity::insert(model).exec(db).await?;
    Ok(())
}

/// Finds a transaction owned by `user_id`, with its category filled in.
pub async fn find_one<C: ConnectionTrait>(
    db: &C,
    transaction_id: Uuid,
    user_id: &str,
) -> ResultEngine<Transaction> {
    let row = transactions::Entity::find_by_id(transaction_id)
        .filter(transactions::Column::UserId.eq(user_id))
        .find_also_related(transaction_categories::Entity)
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    with_link(row)
}

/// Newest first: `date DESC, created_at DESC`.
pub async fn find_all<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    filter: &TransactionListFilter,
) -> ResultEngine<Vec<Transaction>> {
    let range = filter.date_range()?;

    let mut query = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id))
        .find_also_related(transaction_categories::Entity);
    if let Some((from, to)) = range {
        query = query
            .filter(transactions::Column::Date.gte(from))
            .filter(transactions::Column::Date.lt(to));
    }
    if let Some(account_id) = filter.account_id {
        query = query.filter(
            Condition::any()
                .add(transactions::Column::FromAccountId.eq(account_id))
                .add(transactions::Column::ToAccountId.eq(account_id)),
        );
    }
    query = query
        .order_by_desc(transactions::Column::Date)
        .order_by_desc(transactions::Column::CreatedAt);
    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }

    query.all(db).await?.into_iter().map(with_link).collect()
}

/// Transactions touching `account_id` on either leg, oldest first.
pub async fn find_all_for_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
) -> ResultEngine<Vec<Transaction>> {
    transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(transactions::Column::FromAccountId.eq(account_id))
                .add(transactions::Column::ToAccountId.eq(account_id)),
        )
        .order_by_asc(transactions::Column::Date)
        .order_by_asc(transactions::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
}

/// Every transaction of a user, oldest first, without category links.
pub async fn find_all_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<Vec<Transaction>> {
    transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id))
        .order_by_asc(transactions::Column::Date)
        .order_by_asc(transactions::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Transaction::try_from)
        .collect()
}

/// Whether any transaction of the user references the account.
pub async fn references_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
) -> ResultEngine<bool> {
    let count = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id))
        .filter(
            Condition::any()
                .add(transactions::Column::FromAccountId.eq(account_id))
                .add(transactions::Column::ToAccountId.eq(account_id)),
        )
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    transaction_id: Uuid,
    user_id: &str,
    patch: &TransactionFieldsPatch,
) -> ResultEngine<Transaction> {
    if patch.is_empty() {
        return find_one(db, transaction_id, user_id).await;
    }

    let mut query = transactions::Entity::update_many()
        .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()));
    if let Some(amount_minor) = patch.amount_minor {
        query = query.col_expr(transactions::Column::Amount, Expr::value(amount_minor));
    }
    if let Some(description) = &patch.description {
        query = query.col_expr(
            transactions::Column::Description,
            Expr::value(description.clone()),
        );
    }
    if let Some(date) = patch.date {
        query = query.col_expr(transactions::Column::Date, Expr::value(date));
    }
    if let Some(target) = patch.target {
        query = query
            .col_expr(
                transactions::Column::FromAccountId,
                Expr::value(target.from_account_id()),
            )
            .col_expr(
                transactions::Column::ToAccountId,
                Expr::value(target.to_account_id()),
            );
    }
    let result = query
        .filter(transactions::Column::Id.eq(transaction_id))
        .filter(transactions::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    find_one(db, transaction_id, user_id).await
}

/// Physically removes the row. Its category link goes with it.
pub async fn delete<C: ConnectionTrait>(
    db: &C,
    transaction_id: Uuid,
    user_id: &str,
) -> ResultEngine<()> {
    let result = transactions::Entity::delete_many()
        .filter(transactions::Column::Id.eq(transaction_id))
        .filter(transactions::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(())
}

pub async fn delete_all_for_user<C: ConnectionTrait>(db: &C, user_id: &str) -> ResultEngine<u64> {
    let result = transactions::Entity::delete_many()
        .filter(transactions::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
