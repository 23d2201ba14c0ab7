//! # 仪表盘统计

use entity::user_groups;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;

use crate::auth::{Capabilities, Principal, permissions as perms};
use crate::error::{Context, Result};
use crate::web::server::AppState;

use super::admissions::AdmissionsService;
use super::notices::NoticesService;

/// 仪表盘统计数据
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub notice_count: u64,
    pub user_groups_count: u64,
    /// 仅对可查看入学申请的用户返回
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admission_count: Option<u64>,
}

/// 仪表盘首页上下文
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub permissions: Capabilities,
    /// 角色管理入口
    pub can_access_roles: bool,
}

pub struct DashboardService<'a> {
    state: &'a AppState,
    db: &'a DatabaseConnection,
}

impl<'a> DashboardService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            db: state.database.as_ref(),
        }
    }

    pub async fn stats(&self, actor: &Principal) -> Result<DashboardStats> {
        let notice_count = NoticesService::new(self.state).active_count().await?;

        let user_groups_count = user_groups::Entity::find()
            .filter(user_groups::Column::UserId.eq(actor.user_id()))
            .count(self.db)
            .await
            .context("Failed to count user groups")?;

        let admission_count = if actor.has_perm(perms::VIEW_ADMISSION) {
            Some(AdmissionsService::new(self.state).count().await?)
        } else {
            None
        };

        Ok(DashboardStats {
            notice_count,
            user_groups_count,
            admission_count,
        })
    }

    pub async fn overview(&self, actor: &Principal) -> Result<DashboardOverview> {
        Ok(DashboardOverview {
            stats: self.stats(actor).await?,
            permissions: Capabilities::of(actor),
            can_access_roles: actor.can_manage_roles(),
        })
    }
}
