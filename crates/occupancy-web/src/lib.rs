//! # Occupancy Web
//!
//! 面向浏览器的视图服务：每个页面的视图模型以 JSON 形式在页面路径下提供。
//! 负责会话状态、登录登出、路由守卫、入院表单校验以及各页面的数据装配。

pub mod auth;
pub mod error;
pub mod form;
pub mod guard;
pub mod handlers;
pub mod server;
pub mod session;

pub use error::ApiError;
pub use guard::{guard, navigation, Access, NavLink, Navigation, Route};
pub use handlers::{AppState, ViewConfig};
pub use server::WebServer;
pub use session::{
    session_id, ClientSession, FileStorage, KeyValueStorage, MemoryStorage, SessionStore,
    SessionTable, SESSION_COOKIE,
};
