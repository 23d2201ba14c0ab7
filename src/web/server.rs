//! # HTTP 服务器
//!
//! 组装路由与中间件栈并启动 Axum 服务。

use axum::{Extension, Router, middleware};
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{
    HostFilterConfig, host_filter_middleware, request_id_middleware, resolve_principal,
};
use crate::auth::JwtManager;
use crate::config::{AppConfig, ServerConfig};
use crate::error::{PortalError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub database: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    #[must_use]
    pub fn new(database: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        let jwt = Arc::new(JwtManager::new(Arc::new(config.auth.clone())));
        Self {
            database: Arc::new(database),
            config,
            jwt,
        }
    }
}

/// 构建完整路由（含中间件）
pub fn build_router(state: AppState) -> Router {
    let server_config = state.config.server.clone();
    let host_filter = HostFilterConfig::new(&server_config.allowed_hosts);

    let app = super::routes::create_routes(state.clone())
        .layer(middleware::from_fn_with_state(state, resolve_principal))
        .layer(middleware::from_fn(host_filter_middleware))
        .layer(Extension(host_filter))
        .layer(middleware::from_fn(request_id_middleware));

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    if server_config.enable_cors {
        app.layer(service_builder.layer(cors_layer(&server_config)))
    } else {
        app.layer(service_builder)
    }
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::PATCH,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors_layer.allow_origin(Any);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<axum::http::HeaderValue>())
        .collect::<std::result::Result<Vec<_>, axum::http::header::InvalidHeaderValue>>();

    match origins {
        Ok(origins) => cors_layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            cors_layer.allow_origin(Any)
        }
    }
}

/// 启动服务器
pub async fn serve(state: AppState) -> Result<()> {
    let bind_address = state.config.bind_address();
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        PortalError::config_with_source(format!("Invalid bind address '{bind_address}'"), e)
    })?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::ServerSetup,
        "server_start",
        &format!("Starting school portal on {addr}")
    );

    let router = build_router(state);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| PortalError::server_init_with_source(format!("Failed to bind {addr}"), e))?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| PortalError::server_start_with_source("HTTP server error", e))?;

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "server_stopped",
        "School portal stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_fail",
            &format!("Failed to listen for shutdown signal: {e}")
        );
        std::future::pending::<()>().await;
    }
}
