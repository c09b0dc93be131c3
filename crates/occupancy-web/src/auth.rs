//! 员工登录与登出

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use occupancy_core::{OccupancyError, Result, Role, Session};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::guard::{guard, navigation, Access, Navigation, Route};
use crate::handlers::{redirect, AppState};
use crate::session::{expired_session_cookie, session_cookie, ClientSession};

/// 固定的员工账号
const CREDENTIALS: [(&str, &str, Role); 2] = [
    ("nurse", "nurse", Role::Nurse),
    ("admin", "admin", Role::Admin),
];

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// 后续请求以 `Authorization: Bearer` 或 Cookie 携带
    pub session_id: String,
    pub session: Session,
    pub redirect: &'static str,
    pub navigation: Navigation,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub session: Session,
    pub redirect: &'static str,
    pub navigation: Navigation,
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub navigation: Navigation,
}

/// 登录页；已登录用户被重定向到落地页
pub async fn login_page(client: ClientSession) -> Response {
    match guard(Route::Login, &client.session) {
        Access::Redirect(target) => redirect(target),
        Access::Granted => Json(LoginView {
            navigation: navigation(&client.session),
        })
        .into_response(),
    }
}

/// 校验用户名密码
pub fn authenticate(username: &str, password: &str) -> Result<Role> {
    CREDENTIALS
        .iter()
        .find(|(user, pass, _)| *user == username && *pass == password)
        .map(|(_, _, role)| *role)
        .ok_or_else(|| OccupancyError::Auth("Invalid username or password".to_string()))
}

/// 登录处理器；成功后签发新的会话标识并作废旧标识
pub async fn login_handler(
    State(state): State<AppState>,
    client: ClientSession,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Response> {
    info!("Login attempt for user: {}", request.username);

    let role = match authenticate(&request.username, &request.password) {
        Ok(role) => role,
        Err(e) => {
            warn!("Login failed: {}", e);
            return Err(e.into());
        }
    };

    state.session.logout(client.id.as_deref()).await?;
    let (session_id, session) = state.session.login(role).await?;
    info!("User logged in successfully as {}", role);

    let cookie = session_cookie(&session_id);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            session_id,
            session,
            redirect: Route::landing(role).path(),
            navigation: navigation(&session),
        }),
    )
        .into_response())
}

/// 登出处理器
pub async fn logout_handler(
    State(state): State<AppState>,
    client: ClientSession,
) -> ApiResult<Response> {
    state.session.logout(client.id.as_deref()).await?;
    info!("User logged out");

    let session = Session::default();
    Ok((
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(LogoutResponse {
            session,
            redirect: Route::Home.path(),
            navigation: navigation(&session),
        }),
    )
        .into_response())
}
