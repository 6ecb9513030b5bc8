//! Read-only checks that run before any mutation.
//!
//! They are called with the same connection (usually the open DB
//! transaction) the mutation will use, and never write.

use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    Category, EngineError, FinancialAccount, ResultEngine, TransactionKind, TransactionTarget,
    store,
};

pub(crate) fn require_non_negative_amount(amount_minor: i64) -> ResultEngine<()> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(
            "amount_minor must be >= 0".to_string(),
        ));
    }
    Ok(())
}

/// Rejects targets built by hand with identical transfer legs.
pub(crate) fn require_target_shape(target: TransactionTarget) -> ResultEngine<()> {
    if let TransactionTarget::Transfer { from, to } = target {
        TransactionTarget::transfer(from, to)?;
    }
    Ok(())
}

/// An account owned by the user and not soft-deleted.
pub(crate) async fn require_active_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
) -> ResultEngine<FinancialAccount> {
    let account = store::accounts::find_one(db, account_id, user_id).await?;
    if account.deleted {
        return Err(EngineError::KeyNotFound("account not exists".to_string()));
    }
    Ok(account)
}

/// Every account of the target is owned by the user and active.
pub(crate) async fn require_target_accounts<C: ConnectionTrait>(
    db: &C,
    target: TransactionTarget,
    user_id: &str,
) -> ResultEngine<()> {
    require_target_shape(target)?;
    for account_id in target.account_ids() {
        require_active_account(db, account_id, user_id).await?;
    }
    Ok(())
}

/// A category the user may link to a transaction of `kind`.
pub(crate) async fn require_linkable_category<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
    user_id: &str,
    kind: TransactionKind,
) -> ResultEngine<Category> {
    let category = store::categories::find_one(db, category_id, user_id).await?;
    if category.deleted {
        return Err(EngineError::KeyNotFound("category not exists".to_string()));
    }
    if category.kind != kind {
        return Err(EngineError::CategoryMismatch(format!(
            "category '{}' is {}, transaction is {}",
            category.name,
            category.kind.as_str(),
            kind.as_str()
        )));
    }
    Ok(category)
}

/// The initial balance of an account is frozen once a transaction uses it.
pub(crate) async fn require_initial_balance_editable<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    user_id: &str,
) -> ResultEngine<()> {
    if store::transactions::references_account(db, account_id, user_id).await? {
        return Err(EngineError::Conflict(
            "initial balance cannot change once transactions reference the account".to_string(),
        ));
    }
    Ok(())
}

/// The kind of a category is frozen once a transaction links to it.
pub(crate) async fn require_category_kind_editable<C: ConnectionTrait>(
    db: &C,
    category_id: Uuid,
) -> ResultEngine<()> {
    if store::category_links::is_linked(db, category_id).await? {
        return Err(EngineError::Conflict(
            "category kind cannot change once transactions are linked to it".to_string(),
        ));
    }
    Ok(())
}
