use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    Category, EngineError, ResultEngine, TransactionKind, UpdateCategoryCmd, store,
    util::{normalize_category_key, normalize_required_name},
    validation,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a category, soft-deleted or not.
    pub async fn category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<Category> {
        store::categories::find_one(&self.database, category_id, user_id).await
    }

    /// Active categories of the user, by name.
    pub async fn categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        store::categories::find_all(&self.database, user_id).await
    }

    /// Adds a category. Names are unique per user, ignoring case, accents
    /// and spacing.
    pub async fn create_category(
        &self,
        user_id: &str,
        name: &str,
        kind: TransactionKind,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;
        let name_norm = normalize_category_key(&name);
        with_tx!(self, |db_tx| {
            if store::categories::name_taken(&db_tx, user_id, &name_norm, None).await? {
                return Err(EngineError::ExistingKey(name));
            }
            let category = Category::new(user_id.to_string(), name, kind, Utc::now());
            store::categories::insert(&db_tx, &category, name_norm).await?;
            Ok(category)
        })
    }

    /// Renames a category or changes its kind.
    ///
    /// The kind is frozen once any transaction links to the category.
    pub async fn update_category(&self, cmd: UpdateCategoryCmd) -> ResultEngine<Category> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "category"))
            .transpose()?;
        let user_id = cmd.user_id.as_str();
        with_tx!(self, |db_tx| {
            let current = store::categories::find_one(&db_tx, cmd.category_id, user_id).await?;
            if current.deleted {
                return Err(EngineError::KeyNotFound("category not exists".to_string()));
            }

            let kind = cmd.kind.filter(|kind| *kind != current.kind);
            if kind.is_some() {
                validation::require_category_kind_editable(&db_tx, cmd.category_id).await?;
            }

            let name = match name {
                Some(name) => {
                    let name_norm = normalize_category_key(&name);
                    if store::categories::name_taken(
                        &db_tx,
                        user_id,
                        &name_norm,
                        Some(cmd.category_id),
                    )
                    .await?
                    {
                        return Err(EngineError::ExistingKey(name));
                    }
                    Some((name, name_norm))
                }
                None => None,
            };

            store::categories::update(&db_tx, cmd.category_id, user_id, name, kind).await
        })
    }

    /// Soft-deletes a category. Existing links are kept.
    pub async fn delete_category(&self, category_id: Uuid, user_id: &str) -> ResultEngine<()> {
        store::categories::soft_delete(&self.database, category_id, user_id).await
    }
}
