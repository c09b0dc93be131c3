//! 路由守卫与导航

use occupancy_core::{Role, Session};
use serde::Serialize;

/// 页面路由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Home,
    Login,
    AdmissionForm,
    Checkout,
    AdminDashboard,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Home,
        Route::Login,
        Route::AdmissionForm,
        Route::Checkout,
        Route::AdminDashboard,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::AdmissionForm => "/admission-form",
            Route::Checkout => "/checkout",
            Route::AdminDashboard => "/admin-dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }

    /// 允许访问的角色；空表示公开页面
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Route::Home | Route::Login => &[],
            Route::AdmissionForm | Route::Checkout => &[Role::Nurse],
            Route::AdminDashboard => &[Role::Admin],
        }
    }

    pub fn is_public(&self) -> bool {
        self.allowed_roles().is_empty()
    }

    /// 角色登录后的落地页
    pub fn landing(role: Role) -> Route {
        match role {
            Role::Nurse => Route::AdmissionForm,
            Role::Admin => Route::AdminDashboard,
        }
    }
}

/// 守卫判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(Route),
}

/// 判定当前会话能否访问路由
///
/// 已登录但没有角色的会话在受限页面上按未登录处理。
pub fn guard(route: Route, session: &Session) -> Access {
    let role = session.active_role();

    if route.is_public() {
        return match role {
            Some(role) => Access::Redirect(Route::landing(role)),
            None => Access::Granted,
        };
    }

    match role {
        None => Access::Redirect(Route::Login),
        Some(role) if route.allowed_roles().contains(&role) => Access::Granted,
        Some(role) => Access::Redirect(Route::landing(role)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

/// 导航栏
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub title: &'static str,
    /// 点击标题时跳转的路径
    pub brand: &'static str,
    pub links: Vec<NavLink>,
}

pub const LOGOUT_PATH: &str = "/logout";

pub fn navigation(session: &Session) -> Navigation {
    let link = |label, path| NavLink { label, path };

    if !session.logged_in {
        return Navigation {
            title: "Hospital Occupancy Rate Prediction System",
            brand: Route::Home.path(),
            links: vec![
                link("Homepage", Route::Home.path()),
                link("Staff Login", Route::Login.path()),
            ],
        };
    }

    let mut links = match session.role {
        Some(Role::Nurse) => vec![
            link("Admission Form", Route::AdmissionForm.path()),
            link("Checkout Patient", Route::Checkout.path()),
        ],
        Some(Role::Admin) => vec![link("Dashboard", Route::AdminDashboard.path())],
        None => Vec::new(),
    };
    links.push(link("Logout", LOGOUT_PATH));

    Navigation {
        title: "Hospital Occupancy Rate Prediction System",
        brand: session
            .role
            .map_or(Route::Home.path(), |role| Route::landing(role).path()),
        links,
    }
}
