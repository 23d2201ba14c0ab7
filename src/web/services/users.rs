//! # 用户管理服务
//!
//! 仪表盘用户的查询、创建、更新、删除与角色分配。

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDateTime, Utc};
use entity::{groups, groups::Entity as Groups, user_groups, users, users::Entity as Users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::hash_password;
use crate::auth::{Principal, permissions as perms};
use crate::config::AuthConfig;
use crate::error::{Context, PortalError, Result};
use crate::validation_error;
use crate::web::server::AppState;

use super::accounts::{MSG_EMAIL_TAKEN, find_by_email};
use super::shared::forms::{email_address, normalize_email, not_blank};
use super::shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page, search_condition, validate_fields};

const SEARCH_FIELDS: [users::Column; 3] = [
    users::Column::FirstName,
    users::Column::LastName,
    users::Column::Email,
];

pub const MSG_DELETE_SELF: &str = "You cannot delete your own account.";
pub const MSG_DELETE_SUPERUSER: &str = "You cannot delete a superuser.";

/// 用户列表过滤条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub search: Option<String>,
    /// 角色 ID
    pub role: Option<String>,
}

impl UserFilter {
    fn role_id(&self) -> Result<Option<i32>> {
        match self.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| validation_error!("role", "Enter a whole number.")),
        }
    }
}

/// 用户提交数据
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
    /// 仅创建时使用；缺省时使用配置的初始密码
    pub password: Option<String>,
}

#[derive(Debug, Validate)]
struct UserFields {
    #[validate(custom(function = "not_blank"))]
    #[validate(custom(function = "email_address"))]
    #[validate(length(max = 254, message = "Ensure this field has no more than 254 characters."))]
    email: String,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    first_name: String,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    last_name: String,
    #[validate(length(max = 15, message = "Ensure this field has no more than 15 characters."))]
    phone: String,
    is_staff: bool,
    is_active: bool,
}

impl UserFields {
    fn merge(input: &UserInput, existing: Option<&users::Model>) -> Self {
        let text = |value: Option<&String>, current: Option<&String>| {
            value.or(current).map(|v| v.trim().to_string()).unwrap_or_default()
        };
        Self {
            email: normalize_email(&text(input.email.as_ref(), existing.map(|u| &u.email))),
            first_name: text(input.first_name.as_ref(), existing.map(|u| &u.first_name)),
            last_name: text(input.last_name.as_ref(), existing.map(|u| &u.last_name)),
            phone: text(input.phone.as_ref(), existing.map(|u| &u.phone)),
            is_staff: input
                .is_staff
                .or_else(|| existing.map(|u| u.is_staff))
                .unwrap_or(false),
            is_active: input
                .is_active
                .or_else(|| existing.map(|u| u.is_active))
                .unwrap_or(true),
        }
    }
}

/// 用户管理视图
#[derive(Debug, Clone, Serialize)]
pub struct ManagedUser {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub phone: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_superuser: bool,
    /// 角色名称
    pub groups: Vec<String>,
    /// 角色 ID
    pub groups_list: Vec<i32>,
    pub date_joined: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl ManagedUser {
    fn new(user: users::Model, groups: &[groups::Model]) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            is_staff: user.is_staff,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            groups: groups.iter().map(|g| g.name.clone()).collect(),
            groups_list: groups.iter().map(|g| g.id).collect(),
            date_joined: user.date_joined,
            last_login: user.last_login,
        }
    }
}

/// 角色分配：超级用户或持有用户修改权限
fn require_role_assignment(actor: &Principal) -> Result<()> {
    if actor.is_superuser() || actor.has_perm(perms::CHANGE_USER) {
        Ok(())
    } else {
        Err(PortalError::permission_denied(perms::PERMISSION_DENIED_MESSAGE))
    }
}

/// 用户服务
pub struct UsersService<'a> {
    db: &'a DatabaseConnection,
    auth: &'a AuthConfig,
}

impl<'a> UsersService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
            auth: &state.config.auth,
        }
    }

    /// 列出用户，按邮箱排序
    pub async fn list(
        &self,
        actor: &Principal,
        filter: &UserFilter,
        params: PaginationParams,
    ) -> Result<(Vec<ManagedUser>, PaginationInfo)> {
        actor.require_perm(perms::VIEW_USER)?;

        let mut select = Users::find();
        if let Some(condition) = search_condition(&SEARCH_FIELDS, filter.search.as_deref()) {
            select = select.filter(condition);
        }
        if let Some(role_id) = filter.role_id()? {
            let member_ids: Vec<i32> = user_groups::Entity::find()
                .select_only()
                .column(user_groups::Column::UserId)
                .filter(user_groups::Column::GroupId.eq(role_id))
                .into_tuple()
                .all(self.db)
                .await
                .context("Failed to fetch role members")?;
            select = select.filter(users::Column::Id.is_in(member_ids));
        }

        let total = select
            .clone()
            .count(self.db)
            .await
            .context("Failed to count users")?;

        let rows = select
            .order_by_asc(users::Column::Email)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch users")?;

        let items = self.with_groups(rows).await?;
        Ok((items, build_page(total, params)))
    }

    /// 所有用户（角色管理页使用）
    pub async fn all(&self) -> Result<Vec<ManagedUser>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Email)
            .all(self.db)
            .await
            .context("Failed to fetch users")?;
        self.with_groups(rows).await
    }

    pub async fn get(&self, actor: &Principal, id: i32) -> Result<ManagedUser> {
        actor.require_perm(perms::VIEW_USER)?;
        self.managed(id).await
    }

    /// 仪表盘创建用户
    pub async fn create(&self, actor: &Principal, input: &UserInput) -> Result<ServiceResponse<ManagedUser>> {
        actor.require_perm(perms::ADD_USER)?;

        let fields = UserFields::merge(input, None);
        let mut errors = validate_fields(&fields);
        if !errors.contains("email") && find_by_email(self.db, &fields.email).await?.is_some() {
            errors.add("email", MSG_EMAIL_TAKEN);
        }
        errors.into_result()?;

        let supplied = input.password.as_deref().filter(|p| !p.is_empty());
        let password = supplied.unwrap_or(&self.auth.default_user_password);

        let user = users::ActiveModel {
            email: Set(fields.email),
            first_name: Set(fields.first_name),
            last_name: Set(fields.last_name),
            phone: Set(fields.phone),
            password_hash: Set(hash_password(password)?),
            is_staff: Set(fields.is_staff),
            is_active: Set(fields.is_active),
            is_superuser: Set(false),
            date_joined: Set(Utc::now().naive_utc()),
            last_login: Set(None),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .context("Failed to create user")?;

        let message = if supplied.is_some() {
            format!("User {} created successfully!", user.email)
        } else {
            format!(
                "User {} created successfully! Default password: {password}",
                user.email
            )
        };
        Ok(ServiceResponse::with_message(ManagedUser::new(user, &[]), message))
    }

    pub async fn update(
        &self,
        actor: &Principal,
        id: i32,
        input: &UserInput,
        partial: bool,
    ) -> Result<ServiceResponse<ManagedUser>> {
        actor.require_perm(perms::CHANGE_USER)?;
        let existing = self.fetch(id).await?;

        let fields = if partial {
            UserFields::merge(input, Some(&existing))
        } else {
            UserFields::merge(input, None)
        };
        let mut errors = validate_fields(&fields);
        if !errors.contains("email") {
            if let Some(other) = find_by_email(self.db, &fields.email).await? {
                if other.id != existing.id {
                    errors.add("email", MSG_EMAIL_TAKEN);
                }
            }
        }
        errors.into_result()?;

        let mut active: users::ActiveModel = existing.into();
        active.email = Set(fields.email);
        active.first_name = Set(fields.first_name);
        active.last_name = Set(fields.last_name);
        active.phone = Set(fields.phone);
        active.is_staff = Set(fields.is_staff);
        active.is_active = Set(fields.is_active);

        let user = active
            .update(self.db)
            .await
            .context("Failed to update user")?;

        let message = format!("User {} updated successfully!", user.email);
        Ok(ServiceResponse::with_message(self.managed(user.id).await?, message))
    }

    /// 删除用户
    ///
    /// 超级用户与自删保护先于权限检查执行。
    pub async fn delete(&self, actor: &Principal, id: i32) -> Result<ServiceResponse<i32>> {
        let target = self.fetch(id).await?;

        if target.is_superuser && !actor.is_superuser() {
            return Err(PortalError::permission_denied(MSG_DELETE_SUPERUSER));
        }
        if target.id == actor.user_id() {
            return Err(PortalError::permission_denied(MSG_DELETE_SELF));
        }
        actor.require_perm(perms::DELETE_USER)?;

        Users::delete_by_id(target.id)
            .exec(self.db)
            .await
            .context("Failed to delete user")?;

        Ok(ServiceResponse::with_message(
            target.id,
            format!("User {} deleted successfully!", target.email),
        ))
    }

    /// 角色分配页面加载的用户
    pub async fn assignable(&self, actor: &Principal, id: i32) -> Result<ManagedUser> {
        require_role_assignment(actor)?;
        self.managed(id).await
    }

    /// 整体替换用户角色
    ///
    /// `strict` 为真时任一未知角色返回 404；否则忽略未知角色。
    pub async fn set_groups(
        &self,
        actor: &Principal,
        id: i32,
        group_ids: &[i32],
        strict: bool,
    ) -> Result<ServiceResponse<ManagedUser>> {
        require_role_assignment(actor)?;
        let user = self.fetch(id).await?;

        let requested: BTreeSet<i32> = group_ids.iter().copied().collect();
        let known: BTreeSet<i32> = Groups::find()
            .select_only()
            .column(groups::Column::Id)
            .filter(groups::Column::Id.is_in(requested.iter().copied()))
            .into_tuple::<i32>()
            .all(self.db)
            .await
            .context("Failed to fetch groups")?
            .into_iter()
            .collect();

        if strict {
            if let Some(missing) = requested.difference(&known).next() {
                return Err(PortalError::not_found("Group", missing));
            }
        }

        let txn = self.db.begin().await.context("Failed to begin transaction")?;
        replace_user_groups(&txn, user.id, &known).await?;
        txn.commit().await.context("Failed to commit role assignment")?;

        let message = format!("Roles updated for {}", user.email);
        Ok(ServiceResponse::with_message(self.managed(user.id).await?, message))
    }

    async fn managed(&self, id: i32) -> Result<ManagedUser> {
        let user = self.fetch(id).await?;
        let mut items = self.with_groups(vec![user]).await?;
        items
            .pop()
            .ok_or_else(|| PortalError::not_found("User", id))
    }

    async fn fetch(&self, id: i32) -> Result<users::Model> {
        Users::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to fetch user")?
            .ok_or_else(|| PortalError::not_found("User", id))
    }

    /// 批量附带角色信息
    async fn with_groups(&self, rows: Vec<users::Model>) -> Result<Vec<ManagedUser>> {
        let ids: Vec<i32> = rows.iter().map(|u| u.id).collect();
        let links = user_groups::Entity::find()
            .filter(user_groups::Column::UserId.is_in(ids))
            .find_also_related(Groups)
            .order_by_asc(user_groups::Column::GroupId)
            .all(self.db)
            .await
            .context("Failed to fetch user groups")?;

        let mut by_user: BTreeMap<i32, Vec<groups::Model>> = BTreeMap::new();
        for (link, group) in links {
            if let Some(group) = group {
                by_user.entry(link.user_id).or_default().push(group);
            }
        }

        Ok(rows
            .into_iter()
            .map(|user| {
                let groups = by_user.remove(&user.id).unwrap_or_default();
                ManagedUser::new(user, &groups)
            })
            .collect())
    }
}

/// 先清空再写入，调用方负责事务
async fn replace_user_groups<C: ConnectionTrait>(db: &C, user_id: i32, group_ids: &BTreeSet<i32>) -> Result<()> {
    user_groups::Entity::delete_many()
        .filter(user_groups::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .context("Failed to clear user groups")?;

    if group_ids.is_empty() {
        return Ok(());
    }

    let rows = group_ids.iter().map(|group_id| user_groups::ActiveModel {
        user_id: Set(user_id),
        group_id: Set(*group_id),
    });
    user_groups::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await
        .context("Failed to assign user groups")?;
    Ok(())
}
