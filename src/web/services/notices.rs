//! # 公告服务
//!
//! 公告列表、搜索与增删改。未持有 `public.view_notice` 的调用方只能看到启用中的公告。

use chrono::Utc;
use entity::{notices, notices::Entity as Notices};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{Principal, permissions as perms};
use crate::error::{Context, PortalError, Result};
use crate::web::server::AppState;

use super::shared::forms::not_blank;
use super::shared::{PaginationInfo, PaginationParams, ServiceResponse, build_page, search_condition, validate_fields};

const SEARCH_FIELDS: [notices::Column; 2] = [notices::Column::Title, notices::Column::Content];

/// 首页展示的最新公告条数
pub const RECENT_NOTICE_COUNT: u64 = 3;

/// 公告提交数据，缺省字段在更新时沿用原值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticeInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Validate)]
struct NoticeFields {
    #[validate(custom(function = "not_blank"))]
    #[validate(length(max = 200, message = "Ensure this field has no more than 200 characters."))]
    title: String,
    #[validate(custom(function = "not_blank"))]
    content: String,
    is_active: bool,
}

impl NoticeFields {
    fn merge(input: &NoticeInput, existing: Option<&notices::Model>) -> Self {
        Self {
            title: input
                .title
                .clone()
                .or_else(|| existing.map(|n| n.title.clone()))
                .unwrap_or_default()
                .trim()
                .to_string(),
            content: input
                .content
                .clone()
                .or_else(|| existing.map(|n| n.content.clone()))
                .unwrap_or_default(),
            is_active: input
                .is_active
                .or_else(|| existing.map(|n| n.is_active))
                .unwrap_or(true),
        }
    }
}

/// 公告服务
pub struct NoticesService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> NoticesService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            db: state.database.as_ref(),
        }
    }

    /// 列出公告
    ///
    /// `include_inactive` 仅在调用方持有查看权限时生效。
    pub async fn list(
        &self,
        viewer: Option<&Principal>,
        include_inactive: bool,
        search: Option<&str>,
        params: PaginationParams,
    ) -> Result<(Vec<notices::Model>, PaginationInfo)> {
        let see_all = include_inactive && viewer.is_some_and(|p| p.has_perm(perms::VIEW_NOTICE));

        let mut select = Notices::find();
        if !see_all {
            select = select.filter(notices::Column::IsActive.eq(true));
        }
        if let Some(condition) = search_condition(&SEARCH_FIELDS, search) {
            select = select.filter(condition);
        }

        let total = select
            .clone()
            .count(self.db)
            .await
            .context("Failed to count notices")?;

        let items = select
            .order_by_desc(notices::Column::CreatedAt)
            .order_by_desc(notices::Column::Id)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db)
            .await
            .context("Failed to fetch notices")?;

        Ok((items, build_page(total, params)))
    }

    /// 最新的启用公告
    pub async fn recent(&self) -> Result<Vec<notices::Model>> {
        Notices::find()
            .filter(notices::Column::IsActive.eq(true))
            .order_by_desc(notices::Column::CreatedAt)
            .order_by_desc(notices::Column::Id)
            .limit(RECENT_NOTICE_COUNT)
            .all(self.db)
            .await
            .context("Failed to fetch recent notices")
    }

    /// 启用公告数量
    pub async fn active_count(&self) -> Result<u64> {
        Notices::find()
            .filter(notices::Column::IsActive.eq(true))
            .count(self.db)
            .await
            .context("Failed to count active notices")
    }

    /// 获取单条公告；停用公告对无查看权限的调用方不可见
    pub async fn get(&self, viewer: Option<&Principal>, id: i32) -> Result<notices::Model> {
        let notice = self.fetch(id).await?;
        if !notice.is_active && !viewer.is_some_and(|p| p.has_perm(perms::VIEW_NOTICE)) {
            return Err(PortalError::not_found("Notice", id));
        }
        Ok(notice)
    }

    pub async fn create(
        &self,
        actor: &Principal,
        input: &NoticeInput,
    ) -> Result<ServiceResponse<notices::Model>> {
        actor.require_perm(perms::ADD_NOTICE)?;

        let fields = NoticeFields::merge(input, None);
        validate_fields(&fields).into_result()?;

        let now = Utc::now().naive_utc();
        let notice = notices::ActiveModel {
            title: Set(fields.title),
            content: Set(fields.content),
            is_active: Set(fields.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .context("Failed to create notice")?;

        Ok(ServiceResponse::with_message(notice, "Notice created successfully!"))
    }

    /// 更新公告；`partial` 为假时要求提交全部必填字段
    pub async fn update(
        &self,
        actor: &Principal,
        id: i32,
        input: &NoticeInput,
        partial: bool,
    ) -> Result<ServiceResponse<notices::Model>> {
        actor.require_perm(perms::CHANGE_NOTICE)?;
        let existing = self.fetch(id).await?;

        let fields = if partial {
            NoticeFields::merge(input, Some(&existing))
        } else {
            NoticeFields::merge(input, None)
        };
        validate_fields(&fields).into_result()?;

        let mut active: notices::ActiveModel = existing.into();
        active.title = Set(fields.title);
        active.content = Set(fields.content);
        active.is_active = Set(fields.is_active);
        active.updated_at = Set(Utc::now().naive_utc());

        let notice = active
            .update(self.db)
            .await
            .context("Failed to update notice")?;

        Ok(ServiceResponse::with_message(notice, "Notice updated successfully!"))
    }

    pub async fn delete(&self, actor: &Principal, id: i32) -> Result<ServiceResponse<i32>> {
        actor.require_perm(perms::DELETE_NOTICE)?;
        let notice = self.fetch(id).await?;

        Notices::delete_by_id(notice.id)
            .exec(self.db)
            .await
            .context("Failed to delete notice")?;

        Ok(ServiceResponse::with_message(notice.id, "Notice deleted successfully!"))
    }

    async fn fetch(&self, id: i32) -> Result<notices::Model> {
        Notices::find_by_id(id)
            .one(self.db)
            .await
            .context("Failed to fetch notice")?
            .ok_or_else(|| PortalError::not_found("Notice", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_existing_values_for_partial_update() {
        let now = Utc::now().naive_utc();
        let existing = notices::Model {
            id: 1,
            title: "Exam timetable".to_string(),
            content: "Exams start Monday".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let input = NoticeInput {
            is_active: Some(false),
            ..NoticeInput::default()
        };
        let fields = NoticeFields::merge(&input, Some(&existing));
        assert_eq!(fields.title, "Exam timetable");
        assert!(!fields.is_active);
        assert!(validate_fields(&fields).is_empty());
    }

    #[test]
    fn test_missing_title_is_reported() {
        let input = NoticeInput {
            content: Some("Body".to_string()),
            ..NoticeInput::default()
        };
        let errors = validate_fields(&NoticeFields::merge(&input, None));
        assert_eq!(errors.get("title").unwrap(), ["This field is required."]);
        assert!(!errors.contains("content"));
    }

    #[test]
    fn test_overlong_title_is_reported() {
        let input = NoticeInput {
            title: Some("x".repeat(201)),
            content: Some("Body".to_string()),
            is_active: None,
        };
        let errors = validate_fields(&NoticeFields::merge(&input, None));
        assert!(errors.contains("title"));
    }
}
