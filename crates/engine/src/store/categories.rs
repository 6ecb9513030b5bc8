use chrono::Utc;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, TransactionKind, categories};

fn not_found() -> EngineError {
    EngineError::KeyNotFound("category not exists".to_string())
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    category: &Category,
    name_norm: String,
) -> ResultEngine<()> {
    let model = categories::ActiveModel::from_category(category, name_norm);
    categories::Entity::insert(model).exec(db).await?;
    Ok(())
}

/// Finds a category owned by `user_id`, soft-deleted ones included.
pub async fn find_one<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
    user_id: &str,
) -> ResultEngine<Category> {
    let model = categories::Entity::find_by_id(category_id)
        .filter(categories::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(not_found)?;
    Category::try_from(model)
}

/// Active categories of a user, by name.
pub async fn find_all<C: ConnectionTrait>(db: &C, user_id: &str) -> ResultEngine<Vec<Category>> {
    categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .filter(categories::Column::Deleted.eq(false))
        .order_by_asc(categories::Column::NameNorm)
        .all(db)
        .await?
        .into_iter()
        .map(Category::try_from)
        .collect()
}

/// Whether an active category with the normalized name exists, `except`
/// aside.
pub async fn name_taken<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    name_norm: &str,
    except: Option<Uuid>,
) -> ResultEngine<bool> {
    let mut query = categories::Entity::find()
        .filter(categories::Column::UserId.eq(user_id))
        .filter(categories::Column::Deleted.eq(false))
        .filter(categories::Column::NameNorm.eq(name_norm));
    if let Some(except) = except {
        query = query.filter(categories::Column::Id.ne(except));
    }
    Ok(query.one(db).await?.is_some())
}

pub async fn update<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
    user_id: &str,
    name: Option<(String, String)>,
    kind: Option<TransactionKind>,
) -> ResultEngine<Category> {
    let mut query = categories::Entity::update_many()
        .col_expr(categories::Column::UpdatedAt, Expr::value(Utc::now()));
    if let Some((name, name_norm)) = name {
        query = query
            .col_expr(categories::Column::Name, Expr::value(name))
            .col_expr(categories::Column::NameNorm, Expr::value(name_norm));
    }
    if let Some(kind) = kind {
        query = query.col_expr(categories::Column::Kind, Expr::value(kind.as_str()));
    }
    let result = query
        .filter(categories::Column::Id.eq(category_id))
        .filter(categories::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    find_one(db, category_id, user_id).await
}

pub async fn soft_delete<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
    user_id: &str,
) -> ResultEngine<()> {
    let result = categories::Entity::update_many()
        .col_expr(categories::Column::Deleted, Expr::value(true))
        .col_expr(categories::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(categories::Column::Id.eq(category_id))
        .filter(categories::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found());
    }
    Ok(())
}

pub async fn delete_all_for_user<C: ConnectionTrait>(db: &C, user_id: &str) -> ResultEngine<u64> {
    let result = categories::Entity::delete_many()
        .filter(categories::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
