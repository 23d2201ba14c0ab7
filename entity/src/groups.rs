//! # 角色（用户组）实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 角色实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_groups::Entity")]
    UserGroups,
    #[sea_orm(has_many = "super::group_permissions::Entity")]
    GroupPermissions,
}

impl Related<super::user_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserGroups.def()
    }
}

impl Related<super::group_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupPermissions.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        super::user_groups::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::user_groups::Relation::Group.def().rev())
    }
}

impl Related<super::permissions::Entity> for Entity {
    fn to() -> RelationDef {
        super::group_permissions::Relation::Permission.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::group_permissions::Relation::Group.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
