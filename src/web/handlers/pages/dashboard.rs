//! # 仪表盘首页

use axum::{
    extract::{Extension, State},
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::{log_page_error, page, page_error};
use crate::logging::LogComponent;
use crate::web::middleware::auth::LOGIN_URL;
use crate::web::{
    extract::Authenticated, middleware::RequestId, server::AppState,
    services::dashboard::DashboardService,
};

/// 统计数据与能力标志
pub async fn index(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    actor: Authenticated,
    jar: CookieJar,
) -> Response {
    match DashboardService::new(&state).overview(&actor).await {
        Ok(overview) => page(
            jar,
            "dashboard/index",
            json!({
                "user": {
                    "id": actor.user.id,
                    "email": actor.user.email,
                    "first_name": actor.user.first_name,
                    "last_name": actor.user.last_name,
                    "is_superuser": actor.is_superuser(),
                },
                "overview": overview,
            }),
        ),
        Err(err) => {
            log_page_error(&request_id, LogComponent::Dashboard, "overview_fail", "加载仪表盘失败", &err);
            page_error(jar, err, LOGIN_URL)
        }
    }
}
