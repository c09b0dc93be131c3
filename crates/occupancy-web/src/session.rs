//! 会话状态
//!
//! 每个客户端持有一个会话标识（`Authorization: Bearer` 或 `occupancy_session`
//! Cookie），服务端按标识保存 `isLoggedIn` / `userRole` 两个字符串条目，
//! 持久化到键值存储并在启动时恢复。

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use occupancy_core::{OccupancyError, Result, Role, Session};
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::handlers::AppState;

/// 会话 Cookie 名称
pub const SESSION_COOKIE: &str = "occupancy_session";

/// 会话标识 → 该客户端的持久化键值
pub type SessionTable = HashMap<String, HashMap<String, String>>;

/// 键值存储接口
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn load(&self) -> Result<SessionTable>;

    async fn save(&self, table: &SessionTable) -> Result<()>;
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn load(&self) -> Result<SessionTable> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Session file {} not found, starting with no sessions", self.path.display());
                Ok(HashMap::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, table: &SessionTable) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(table)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStorage {
    table: RwLock<SessionTable>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: SessionTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn load(&self) -> Result<SessionTable> {
        Ok(self.table.read().await.clone())
    }

    async fn save(&self, table: &SessionTable) -> Result<()> {
        *self.table.write().await = table.clone();
        Ok(())
    }
}

/// 从请求头读取会话标识，Bearer 优先于 Cookie
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// 发起请求的客户端及其会话
#[derive(Debug, Clone, Default)]
pub struct ClientSession {
    pub id: Option<String>,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let id = session_id(&parts.headers);
        let session = state.session.current(id.as_deref()).await;
        Ok(Self { id, session })
    }
}

/// 所有客户端的会话及其持久化
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    /// 从存储恢复会话，丢弃未登录的条目
    pub async fn restore(storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
        let sessions: HashMap<String, Session> = storage
            .load()
            .await?
            .iter()
            .map(|(id, entries)| (id.clone(), Session::from_entries(entries)))
            .filter(|(_, session)| session.logged_in)
            .collect();
        info!("Restored {} client sessions", sessions.len());
        Ok(Self {
            storage,
            sessions: RwLock::new(sessions),
        })
    }

    /// 未知或缺失的标识视为未登录
    pub async fn current(&self, id: Option<&str>) -> Session {
        match id {
            Some(id) => self
                .sessions
                .read()
                .await
                .get(id)
                .copied()
                .unwrap_or_default(),
            None => Session::default(),
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 登录并签发新的会话标识
    pub async fn login(&self, role: Role) -> Result<(String, Session)> {
        let id = Uuid::new_v4().to_string();
        let session = Session::logged_in_as(role);
        self.update(|sessions| {
            sessions.insert(id.clone(), session);
        })
        .await?;
        Ok((id, session))
    }

    pub async fn logout(&self, id: Option<&str>) -> Result<()> {
        let Some(id) = id else {
            return Ok(());
        };
        self.update(|sessions| {
            sessions.remove(id);
        })
        .await
    }

    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, Session>),
    {
        let mut sessions = self.sessions.write().await;
        let mut next = sessions.clone();
        change(&mut next);

        let table: SessionTable = next
            .iter()
            .map(|(id, session)| (id.clone(), session.to_entries()))
            .collect();
        self.storage
            .save(&table)
            .await
            .map_err(|e| OccupancyError::Storage(format!("Failed to save session: {}", e)))?;
        *sessions = next;
        Ok(())
    }
}
