//! # 角色与权限服务
//!
//! 角色（权限组）的增删改仅限超级用户；查看角色与权限目录需要角色管理入口权限。

use std::collections::{BTreeMap, BTreeSet};

use entity::{
    content_types, group_permissions, groups, groups::Entity as Groups, permissions,
    permissions::Entity as Permissions, user_groups,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::auth::{Principal, permissions as perms};
use crate::error::{Context, PortalError, Result};
use crate::validation_error;
use crate::web::server::AppState;

pub const MSG_NAME_REQUIRED: &str = "Role name is required.";
pub const MSG_NAME_TAKEN: &str = "A role with this name already exists.";
const MAX_NAME_LEN: usize = 150;

/// 角色提交数据
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleInput {
    pub name: Option<String>,
    /// 权限 ID；缺省时整体更新会清空权限
    pub permissions: Option<Vec<i32>>,
}

/// 权限目录项
#[derive(Debug, Clone, Serialize)]
pub struct PermissionInfo {
    pub id: i32,
    pub name: String,
    pub codename: String,
    pub content_type: i32,
    pub content_type_name: String,
    /// `app_label.codename`
    pub permission: String,
}

impl PermissionInfo {
    fn new(permission: permissions::Model, content_type: &content_types::Model) -> Self {
        Self {
            permission: format!("{}.{}", content_type.app_label, permission.codename),
            id: permission.id,
            name: permission.name,
            codename: permission.codename,
            content_type: content_type.id,
            content_type_name: content_type.name.clone(),
        }
    }
}

/// 角色详情
#[derive(Debug, Clone, Serialize)]
pub struct RoleSummary {
    pub id: i32,
    pub name: String,
    pub permissions: Vec<i32>,
    pub permissions_list: Vec<PermissionInfo>,
    pub user_count: u64,
}

/// 仅限超级用户的角色操作
#[derive(Debug, Clone, Copy)]
pub enum RoleAction {
    Create,
    Edit,
    Delete,
}

impl RoleAction {
    #[must_use]
    pub const fn denied_message(&self) -> &'static str {
        match self {
            Self::Create => "Only superadmins can create roles.",
            Self::Edit => "Only superadmins can edit roles.",
            Self::Delete => "Only superadmins can delete roles.",
        }
    }
}

pub fn require_superuser(actor: &Principal, action: &RoleAction) -> Result<()> {
    if actor.is_superuser() {
        Ok(())
    } else {
        Err(PortalError::permission_denied(action.denied_message()))
    }
}

fn require_role_access(actor: &Principal) -> Result<()> {
    if actor.can_manage_roles() {
        Ok(())
    } else {
        Err(PortalError::permission_denied(perms::PERMISSION_DENIED_MESSAGE))
    }
}

/// 角色服务
pub struct RolesService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RolesService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    /// 所有角色，按名称排序
    pub async fn list(&self, actor: &Principal) -> Result<Vec<RoleSummary>> {
        require_role_access(actor)?;
        let rows = Groups::find()
            .order_by_asc(groups::Column::Name)
            .all(self.db)
            .await
            .context("Failed to fetch roles")?;

        let mut summaries = Vec::with_capacity(rows.len());
        for group in rows {
            summaries.push(self.summarize(group).await?);
        }
        Ok(summaries)
    }

    pub async fn get(&self, actor: &Principal, id: i32) -> Result<RoleSummary> {
        require_role_access(actor)?;
        let group = self.fetch(id).await?;
        self.summarize(group).await
    }

    pub async fn create(&self, actor: &Principal, input: &RoleInput) -> Result<RoleSummary> {
        require_superuser(actor, &RoleAction::Create)?;
        let name = self.clean_name(input.name.as_deref(), None).await?;

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let group = groups::ActiveModel {
            name: Set(name),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to create role")?;

        let permission_ids = input.permissions.clone().unwrap_or_default();
        replace_group_permissions(&txn, group.id, &permission_ids).await?;
        txn.commit().await.context("Failed to commit role")?;

        self.summarize(group).await
    }

    /// 更新角色；`partial` 为真时缺省字段保持不变
    pub async fn update(
        &self,
        actor: &Principal,
        id: i32,
        input: &RoleInput,
        partial: bool,
    ) -> Result<RoleSummary> {
        require_superuser(actor, &RoleAction::Edit)?;
        let group = self.fetch(id).await?;

        let name = match (&input.name, partial) {
            (None, true) => group.name.clone(),
            (name, _) => self.clean_name(name.as_deref(), Some(group.id)).await?,
        };

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        let mut active: groups::ActiveModel = group.into();
        active.name = Set(name);
        let group = active
            .update(&txn)
            .await
            .context("Failed to update role")?;

        match (&input.permissions, partial) {
            (None, true) => {}
            (permission_ids, _) => {
                let permission_ids = permission_ids.clone().unwrap_or_default();
                replace_group_permissions(&txn, group.id, &permission_ids).await?;
            }
        }
        txn.commit().await.context("Failed to commit role")?;

        self.summarize(group).await
    }

    /// 删除角色，返回角色名称
    pub async fn delete(&self, actor: &Principal, id: i32) -> Result<String> {
        require_superuser(actor, &RoleAction::Delete)?;
        let group = self.fetch(id).await?;

        Groups::delete_by_id(group.id)
            .exec(self.db)
            .await
            .context("Failed to delete role")?;
        Ok(group.name)
    }

    /// 权限目录，按内容类型名称与权限名称排序
    pub async fn catalog(&self, actor: &Principal) -> Result<Vec<PermissionInfo>> {
        require_role_access(actor)?;
        self.all_permissions().await
    }

    pub async fn permission(&self, actor: &Principal, id: i32) -> Result<PermissionInfo> {
        require_role_access(actor)?;
        let (permission, content_type) = Permissions::find_by_id(id)
            .find_also_related(content_types::Entity)
            .one(self.db)
            .await
            .context("Failed to fetch permission")?
            .ok_or_else(|| PortalError::not_found("Permission", id))?;
        let content_type = content_type.ok_or_else(|| PortalError::not_found("Permission", id))?;
        Ok(PermissionInfo::new(permission, &content_type))
    }

    /// 角色下拉选项（用户筛选与角色分配表单）
    pub async fn options(&self) -> Result<Vec<groups::Model>> {
        Groups::find()
            .order_by_asc(groups::Column::Name)
            .all(self.db)
            .await
            .context("Failed to fetch roles")
    }

    /// 全部权限（表单选项）
    pub async fn all_permissions(&self) -> Result<Vec<PermissionInfo>> {
        let rows = Permissions::find()
            .find_also_related(content_types::Entity)
            .order_by_asc(content_types::Column::Name)
            .order_by_asc(permissions::Column::Name)
            .all(self.db)
            .await
            .context("Failed to fetch permissions")?;

        Ok(rows
            .into_iter()
            .filter_map(|(permission, ct)| ct.map(|ct| PermissionInfo::new(permission, &ct)))
            .collect())
    }

    async fn clean_name(&self, name: Option<&str>, exclude: Option<i32>) -> Result<String> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(validation_error!("name", MSG_NAME_REQUIRED));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(validation_error!(
                "name",
                "Ensure this field has no more than {} characters.",
                MAX_NAME_LEN
            ));
        }

        let mut select = Groups::find().filter(groups::Column::Name.eq(name));
        if let Some(id) = exclude {
            select = select.filter(groups::Column::Id.ne(id));
        }
        let taken = select
            .count(self.db)
            .await
            .context("Failed to check role name")?;
        if taken > 0 {
            return Err(validation_error!("name", MSG_NAME_TAKEN));
        }
        Ok(name.to_string())
    }

    async fn fetch(&self, id: i32) -> Result<groups::Model> {
        Groups::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to fetch role")?
            .ok_or_else(|| PortalError::not_found("Group", id))
    }

    async fn summarize(&self, group: groups::Model) -> Result<RoleSummary> {
        let permission_ids: Vec<i32> = group_permissions::Entity::find()
            .select_only()
            .column(group_permissions::Column::PermissionId)
            .filter(group_permissions::Column::GroupId.eq(group.id))
            .into_tuple()
            .all(self.db)
            .await
            .context("Failed to fetch role permissions")?;

        let permissions_list = Permissions::find()
            .filter(permissions::Column::Id.is_in(permission_ids.clone()))
            .find_also_related(content_types::Entity)
            .order_by_asc(content_types::Column::Name)
            .order_by_asc(permissions::Column::Name)
            .all(self.db)
            .await
            .context("Failed to fetch role permissions")?
            .into_iter()
            .filter_map(|(permission, ct)| ct.map(|ct| PermissionInfo::new(permission, &ct)))
            .collect();

        let user_count = user_groups::Entity::find()
            .filter(user_groups::Column::GroupId.eq(group.id))
            .count(self.db)
            .await
            .context("Failed to count role members")?;

        let mut permissions = permission_ids;
        permissions.sort_unstable();

        Ok(RoleSummary {
            id: group.id,
            name: group.name,
            permissions,
            permissions_list,
            user_count,
        })
    }
}

/// 以提交的集合替换角色权限，未知权限 ID 被忽略
async fn replace_group_permissions<C: ConnectionTrait>(db: &C, group_id: i32, permission_ids: &[i32]) -> Result<()> {
    group_permissions::Entity::delete_many()
        .filter(group_permissions::Column::GroupId.eq(group_id))
        .exec(db)
        .await
        .context("Failed to clear role permissions")?;

    let requested: BTreeSet<i32> = permission_ids.iter().copied().collect();
    if requested.is_empty() {
        return Ok(());
    }

    let known: Vec<i32> = Permissions::find()
        .select_only()
        .column(permissions::Column::Id)
        .filter(permissions::Column::Id.is_in(requested))
        .into_tuple()
        .all(db)
        .await
        .context("Failed to fetch permissions")?;
    if known.is_empty() {
        return Ok(());
    }

    let rows = known.into_iter().map(|permission_id| group_permissions::ActiveModel {
        group_id: Set(group_id),
        permission_id: Set(permission_id),
    });
    group_permissions::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .context("Failed to assign role permissions")?;
    Ok(())
}

/// 按内容类型分组的权限（角色表单使用）
#[must_use]
pub fn group_by_content_type(permissions: &[PermissionInfo]) -> BTreeMap<String, Vec<PermissionInfo>> {
    let mut grouped: BTreeMap<String, Vec<PermissionInfo>> = BTreeMap::new();
    for permission in permissions {
        grouped
            .entry(permission.content_type_name.clone())
            .or_default()
            .push(permission.clone());
    }
    grouped
}
