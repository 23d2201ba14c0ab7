//! # 路由配置
//!
//! 定义所有页面路由与 API 路由

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use super::handlers::{api, pages, system};
use super::middleware::{require_api_auth, require_login};
use super::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(system::ping_handler))
        // 公开页面
        .merge(public_routes())
        // 账号页面
        .merge(account_routes())
        // 仪表盘页面（需登录）
        .merge(dashboard_routes())
        // REST API
        .merge(api_routes())
        .with_state(state)
}

/// 公开页面路由
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::public::home))
        .route("/notices/", get(pages::public::notice_list))
        .route(
            "/admission/",
            get(pages::public::admission_form).post(pages::public::admission_submit),
        )
        .route("/admission/success/", get(pages::public::admission_success))
}

/// 登录、注册与登出
fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/login/",
            get(pages::accounts::login_form).post(pages::accounts::login),
        )
        .route(
            "/accounts/register/",
            get(pages::accounts::register_form).post(pages::accounts::register),
        )
        .route("/accounts/logout/", post(pages::accounts::logout))
}

/// 仪表盘页面路由
fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/", get(pages::dashboard::index))
        .merge(dashboard_notice_routes())
        .merge(dashboard_admission_routes())
        .merge(dashboard_user_routes())
        .merge(dashboard_role_routes())
        .route_layer(middleware::from_fn(require_login))
}

fn dashboard_notice_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/notices/", get(pages::notices::list))
        .route(
            "/dashboard/notices/create/",
            get(pages::notices::create_form).post(pages::notices::create),
        )
        .route("/dashboard/notices/{id}/", get(pages::notices::detail))
        .route(
            "/dashboard/notices/{id}/edit/",
            get(pages::notices::edit_form).post(pages::notices::update),
        )
        .route(
            "/dashboard/notices/{id}/delete/",
            get(pages::notices::confirm_delete).post(pages::notices::delete),
        )
}

fn dashboard_admission_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/admissions/", get(pages::admissions::list))
        .route(
            "/dashboard/admissions/create/",
            get(pages::admissions::create_form).post(pages::admissions::create),
        )
        .route("/dashboard/admissions/{id}/", get(pages::admissions::detail))
        .route(
            "/dashboard/admissions/{id}/edit/",
            get(pages::admissions::edit_form).post(pages::admissions::update),
        )
        .route(
            "/dashboard/admissions/{id}/delete/",
            get(pages::admissions::confirm_delete).post(pages::admissions::delete),
        )
}

fn dashboard_user_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/users/", get(pages::users::list))
        .route(
            "/dashboard/users/create/",
            get(pages::users::create_form).post(pages::users::create),
        )
        .route("/dashboard/users/{id}/", get(pages::users::detail))
        .route(
            "/dashboard/users/{id}/edit/",
            get(pages::users::edit_form).post(pages::users::update),
        )
        .route(
            "/dashboard/users/{id}/delete/",
            get(pages::users::confirm_delete).post(pages::users::delete),
        )
}

fn dashboard_role_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/roles/", get(pages::roles::index))
        .route(
            "/dashboard/roles/create/",
            get(pages::roles::create_form).post(pages::roles::create),
        )
        .route(
            "/dashboard/roles/{id}/edit/",
            get(pages::roles::edit_form).post(pages::roles::update),
        )
        .route(
            "/dashboard/roles/{id}/delete/",
            get(pages::roles::confirm_delete).post(pages::roles::delete),
        )
        .route(
            "/dashboard/roles/users/{id}/",
            get(pages::roles::user_roles_form).post(pages::roles::update_user_roles),
        )
}

/// REST API 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(api_auth_routes())
        .merge(api_public_routes())
        .merge(api_dashboard_routes())
}

fn api_auth_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/users/me/", get(api::auth::me))
        .route_layer(middleware::from_fn(require_api_auth));

    Router::new()
        .route("/api/auth/jwt/create/", post(api::auth::create_token))
        .route("/api/auth/jwt/refresh/", post(api::auth::refresh_token))
        .route("/api/auth/users/", post(api::auth::register))
        .merge(protected)
}

/// 公告与入学申请；写操作在处理器内检查身份与权限
fn api_public_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/public/notices/",
            get(api::notices::list).post(api::notices::create),
        )
        .route("/api/public/notices/recent/", get(api::notices::recent))
        .route(
            "/api/public/notices/{id}/",
            get(api::notices::detail)
                .put(api::notices::replace)
                .patch(api::notices::patch)
                .delete(api::notices::delete),
        )
        .route(
            "/api/public/admissions/",
            get(api::admissions::list).post(api::admissions::submit),
        )
        .route(
            "/api/public/admissions/{id}/",
            get(api::admissions::detail)
                .put(api::admissions::replace)
                .patch(api::admissions::patch)
                .delete(api::admissions::delete),
        )
}

fn api_dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard/stats/", get(api::dashboard::stats))
        .route("/api/dashboard/permissions/", get(api::dashboard::capabilities))
        .route(
            "/api/dashboard/users/",
            get(api::users::list).post(api::users::create),
        )
        .route(
            "/api/dashboard/users/{id}/",
            get(api::users::detail)
                .put(api::users::replace)
                .patch(api::users::patch)
                .delete(api::users::delete),
        )
        .route("/api/dashboard/users/{id}/update_roles/", post(api::users::update_roles))
        .route(
            "/api/dashboard/groups/",
            get(api::groups::list).post(api::groups::create),
        )
        .route(
            "/api/dashboard/groups/{id}/",
            get(api::groups::detail)
                .put(api::groups::replace)
                .patch(api::groups::patch)
                .delete(api::groups::delete),
        )
        .route("/api/dashboard/permissions/catalog/", get(api::permissions::list))
        .route("/api/dashboard/permissions/{id}/", get(api::permissions::detail))
        .route_layer(middleware::from_fn(require_api_auth))
}
