//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use occupancy_core::Result;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{login_handler, login_page, logout_handler};
use crate::handlers::{
    admin_dashboard, admission_form, cancel_discharge, checkout, confirm_discharge,
    discharge_patient, health, home, nav, submit_admission, AppState,
};

pub struct WebServer {
    addr: SocketAddr,
    state: AppState,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// 运行服务器，直到关闭令牌被取消
    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let shutdown = self.state.shutdown.clone();
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, create_app(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Web server stopped");
        Ok(())
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // 公开页面
        .route("/", get(home))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/nav", get(nav))
        // 健康检查
        .route("/health", get(health))
        // 护士页面
        .route("/admission-form", get(admission_form).post(submit_admission))
        .route("/checkout", get(checkout))
        .route("/checkout/:eid/confirm", post(confirm_discharge))
        .route("/checkout/:eid/cancel", post(cancel_discharge))
        .route("/checkout/:eid/discharge", post(discharge_patient))
        // 管理员页面
        .route("/admin-dashboard", get(admin_dashboard))
        .with_state(state)
        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}
