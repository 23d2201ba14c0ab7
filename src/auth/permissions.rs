//! # 权限模型
//!
//! 权限字符串形如 `app_label.codename`。已认证调用方在请求开始时解析为
//! [`Principal`]，其权限集合为所属角色权限的并集。

use std::collections::BTreeSet;

use entity::{content_types, group_permissions, permissions, user_groups, users};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;

use crate::error::{Context, PortalError, Result};

pub const VIEW_NOTICE: &str = "public.view_notice";
pub const ADD_NOTICE: &str = "public.add_notice";
pub const CHANGE_NOTICE: &str = "public.change_notice";
pub const DELETE_NOTICE: &str = "public.delete_notice";

pub const VIEW_ADMISSION: &str = "public.view_admissionapplication";
pub const ADD_ADMISSION: &str = "public.add_admissionapplication";
pub const CHANGE_ADMISSION: &str = "public.change_admissionapplication";
pub const DELETE_ADMISSION: &str = "public.delete_admissionapplication";

pub const VIEW_USER: &str = "accounts.view_user";
pub const ADD_USER: &str = "accounts.add_user";
pub const CHANGE_USER: &str = "accounts.change_user";
pub const DELETE_USER: &str = "accounts.delete_user";

pub const VIEW_GROUP: &str = "auth.view_group";
pub const ADD_GROUP: &str = "auth.add_group";
pub const CHANGE_GROUP: &str = "auth.change_group";
pub const DELETE_GROUP: &str = "auth.delete_group";

pub const VIEW_PERMISSION: &str = "auth.view_permission";

/// API 统一的 403 提示
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";

/// 已认证的调用方
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: users::Model,
    permissions: BTreeSet<String>,
}

impl Principal {
    #[must_use]
    pub fn new(user: users::Model, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            user,
            permissions: permissions.into_iter().collect(),
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.user.id
    }

    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.user.is_active && self.user.is_superuser
    }

    /// 停用用户没有任何权限；启用的超级用户拥有全部权限
    #[must_use]
    pub fn has_perm(&self, perm: &str) -> bool {
        if !self.user.is_active {
            return false;
        }
        self.user.is_superuser || self.permissions.contains(perm)
    }

    #[must_use]
    pub fn has_any_perm(&self, perms: &[&str]) -> bool {
        perms.iter().any(|perm| self.has_perm(perm))
    }

    /// 缺少权限时返回 403
    pub fn require_perm(&self, perm: &str) -> Result<()> {
        if self.has_perm(perm) {
            Ok(())
        } else {
            Err(PortalError::permission_denied(PERMISSION_DENIED_MESSAGE))
        }
    }

    /// 角色管理入口：超级用户、可修改用户或可查看角色
    #[must_use]
    pub fn can_manage_roles(&self) -> bool {
        self.is_superuser() || self.has_any_perm(&[CHANGE_USER, VIEW_GROUP])
    }

    #[must_use]
    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}

/// 仪表盘能力摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    pub can_view_notices: bool,
    pub can_add_notices: bool,
    pub can_change_notices: bool,
    pub can_delete_notices: bool,
    pub can_view_admissions: bool,
    pub can_add_admissions: bool,
    pub can_change_admissions: bool,
    pub can_delete_admissions: bool,
    pub can_manage_roles: bool,
    pub can_manage_users: bool,
}

impl Capabilities {
    #[must_use]
    pub fn of(principal: &Principal) -> Self {
        Self {
            can_view_notices: principal.has_perm(VIEW_NOTICE),
            can_add_notices: principal.has_perm(ADD_NOTICE),
            can_change_notices: principal.has_perm(CHANGE_NOTICE),
            can_delete_notices: principal.has_perm(DELETE_NOTICE),
            can_view_admissions: principal.has_perm(VIEW_ADMISSION),
            can_add_admissions: principal.has_perm(ADD_ADMISSION),
            can_change_admissions: principal.has_perm(CHANGE_ADMISSION),
            can_delete_admissions: principal.has_perm(DELETE_ADMISSION),
            can_manage_roles: principal.has_any_perm(&[
                VIEW_GROUP,
                ADD_GROUP,
                CHANGE_GROUP,
                DELETE_GROUP,
            ]),
            can_manage_users: principal.has_any_perm(&[
                VIEW_USER, ADD_USER, CHANGE_USER, DELETE_USER,
            ]),
        }
    }
}

/// 读取用户所属角色的全部权限字符串
pub async fn load_permissions<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<BTreeSet<String>> {
    let group_ids: Vec<i32> = user_groups::Entity::find()
        .select_only()
        .column(user_groups::Column::GroupId)
        .filter(user_groups::Column::UserId.eq(user_id))
        .into_tuple()
        .all(db)
        .await
        .context("Failed to load user groups")?;

    if group_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let permission_ids: Vec<i32> = group_permissions::Entity::find()
        .select_only()
        .column(group_permissions::Column::PermissionId)
        .filter(group_permissions::Column::GroupId.is_in(group_ids))
        .into_tuple()
        .all(db)
        .await
        .context("Failed to load group permissions")?;

    if permission_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let rows = permissions::Entity::find()
        .filter(permissions::Column::Id.is_in(permission_ids))
        .find_also_related(content_types::Entity)
        .all(db)
        .await
        .context("Failed to load permissions")?;

    Ok(rows
        .into_iter()
        .filter_map(|(perm, content_type)| {
            content_type.map(|ct| format!("{}.{}", ct.app_label, perm.codename))
        })
        .collect())
}

/// 解析用户为调用方，停用用户视为匿名
pub async fn load_principal<C: ConnectionTrait>(db: &C, user: users::Model) -> Result<Option<Principal>> {
    if !user.is_active {
        return Ok(None);
    }
    let permissions = load_permissions(db, user.id).await?;
    Ok(Some(Principal::new(user, permissions)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_active: bool, is_superuser: bool) -> users::Model {
        users::Model {
            id: 7,
            email: "staff@school.test".to_string(),
            first_name: "Staff".to_string(),
            last_name: "Member".to_string(),
            phone: String::new(),
            password_hash: String::new(),
            is_staff: true,
            is_active,
            is_superuser,
            date_joined: Utc::now().naive_utc(),
            last_login: None,
        }
    }

    #[test]
    fn test_group_permissions_grant_access() {
        let principal = Principal::new(user(true, false), [ADD_NOTICE.to_string()]);
        assert!(principal.has_perm(ADD_NOTICE));
        assert!(!principal.has_perm(DELETE_NOTICE));
        assert!(principal.require_perm(DELETE_NOTICE).is_err());
    }

    #[test]
    fn test_active_superuser_has_everything() {
        let principal = Principal::new(user(true, true), Vec::<String>::new());
        assert!(principal.has_perm(DELETE_USER));
        assert!(principal.can_manage_roles());
        assert!(Capabilities::of(&principal).can_manage_users);
    }

    #[test]
    fn test_inactive_user_has_nothing() {
        let principal = Principal::new(user(false, true), [ADD_NOTICE.to_string()]);
        assert!(!principal.has_perm(ADD_NOTICE));
        assert!(!principal.is_superuser());
    }

    #[test]
    fn test_role_gate_accepts_change_user_or_view_group() {
        let via_user = Principal::new(user(true, false), [CHANGE_USER.to_string()]);
        let via_group = Principal::new(user(true, false), [VIEW_GROUP.to_string()]);
        let neither = Principal::new(user(true, false), [VIEW_USER.to_string()]);
        assert!(via_user.can_manage_roles());
        assert!(via_group.can_manage_roles());
        assert!(!neither.can_manage_roles());
    }

    #[test]
    fn test_capabilities_reflect_permissions() {
        let principal = Principal::new(
            user(true, false),
            [VIEW_NOTICE.to_string(), VIEW_ADMISSION.to_string()],
        );
        let caps = Capabilities::of(&principal);
        assert!(caps.can_view_notices);
        assert!(!caps.can_add_notices);
        assert!(caps.can_view_admissions);
        assert!(!caps.can_manage_roles);
    }
}
