//! # 权限实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 权限实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub codename: String,
    pub name: String,
    pub content_type_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::content_types::Entity",
        from = "Column::ContentTypeId",
        to = "super::content_types::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ContentType,
    #[sea_orm(has_many = "super::group_permissions::Entity")]
    GroupPermissions,
}

impl Related<super::content_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentType.def()
    }
}

impl Related<super::group_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupPermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
