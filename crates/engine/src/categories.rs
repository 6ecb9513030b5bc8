//! Category registry per user.
//!
//! A category has the same kind as the transactions it may be linked to.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, TransactionKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: TransactionKind,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(user_id: String, name: String, kind: TransactionKind, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub name_norm: String,
    pub kind: String,
    pub deleted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction_categories::Entity")]
    Links,
}

impl Related<super::transaction_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_category(category: &Category, name_norm: String) -> Self {
        Self {
            id: ActiveValue::Set(category.id),
            user_id: ActiveValue::Set(category.user_id.clone()),
            name: ActiveValue::Set(category.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            kind: ActiveValue::Set(category.kind.as_str().to_string()),
            deleted: ActiveValue::Set(category.deleted),
            created_at: ActiveValue::Set(category.created_at),
            updated_at: ActiveValue::Set(category.updated_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            deleted: model.deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
