//! One optional category per transaction.

use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, prelude::*, sea_query::Query};
use uuid::Uuid;

use crate::{ResultEngine, transaction_categories, transactions};

pub async fn create<C: ConnectionTrait>(
    db: &C,
    transaction_id: Uuid,
    category_id: Uuid,
) -> ResultEngine<()> {
    let link = transaction_categories::ActiveModel {
        transaction_id: ActiveValue::Set(transaction_id),
        category_id: ActiveValue::Set(category_id),
    };
    transaction_categories::Entity::insert(link).exec(db).await?;
    Ok(())
}

/// Delete-then-insert, so at most one link survives.
pub async fn replace<C: ConnectionTrait>(
    db: &C,
    transaction_id: Uuid,
    category_id: Uuid,
) -> ResultEngine<()> {
    remove(db, transaction_id).await?;
    create(db, transaction_id, category_id).await
}

/// Removes the link if there is one.
pub async fn remove<C: ConnectionTrait>(db: &C, transaction_id: Uuid) -> ResultEngine<()> {
    transaction_categories::Entity::delete_many()
        .filter(transaction_categories::Column::TransactionId.eq(transaction_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Whether any transaction is linked to the category.
pub async fn is_linked<C: ConnectionTrait>(db: &C, category_id: Uuid) -> ResultEngine<bool> {
    let count = transaction_categories::Entity::find()
        .filter(transaction_categories::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Removes the links of every transaction of a user.
pub async fn remove_for_user<C: ConnectionTrait>(db: &C, user_id: &str) -> ResultEngine<u64> {
    let owned = Query::select()
        .column(transactions::Column::Id)
        .from(transactions::Entity)
        .and_where(transactions::Column::UserId.eq(user_id))
        .to_owned();
    let result = transaction_categories::Entity::delete_many()
        .filter(transaction_categories::Column::TransactionId.in_subquery(owned))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
