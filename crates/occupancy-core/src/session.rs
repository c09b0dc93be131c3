//! 会话模型
//!
//! 会话以两条字符串键值持久化：`isLoggedIn` 与 `userRole`。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::OccupancyError;

/// 持久化键：登录标记
pub const LOGGED_IN_KEY: &str = "isLoggedIn";
/// 持久化键：用户角色
pub const ROLE_KEY: &str = "userRole";

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 护士 - 入院登记与出院办理
    Nurse,
    /// 管理员 - 查看统计看板
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Nurse => "nurse",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = OccupancyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nurse" => Ok(Role::Nurse),
            "admin" => Ok(Role::Admin),
            other => Err(OccupancyError::Validation(format!("unknown role: {other}"))),
        }
    }
}

/// 当前会话
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub logged_in: bool,
    pub role: Option<Role>,
}

impl Session {
    pub fn logged_in_as(role: Role) -> Self {
        Self {
            logged_in: true,
            role: Some(role),
        }
    }

    /// 已登录且带有有效角色时返回角色
    pub fn active_role(&self) -> Option<Role> {
        if self.logged_in {
            self.role
        } else {
            None
        }
    }

    /// 序列化为持久化键值；未登录时不写任何键
    pub fn to_entries(&self) -> HashMap<String, String> {
        let mut entries = HashMap::new();
        if self.logged_in {
            entries.insert(LOGGED_IN_KEY.to_string(), "true".to_string());
            if let Some(role) = self.role {
                entries.insert(ROLE_KEY.to_string(), role.to_string());
            }
        }
        entries
    }

    /// 从持久化键值恢复会话
    pub fn from_entries(entries: &HashMap<String, String>) -> Self {
        let logged_in = entries.get(LOGGED_IN_KEY).map(String::as_str) == Some("true");
        let role = if logged_in {
            entries.get(ROLE_KEY).and_then(|r| r.parse().ok())
        } else {
            None
        };
        Self { logged_in, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_round_trip() {
        let session = Session::logged_in_as(Role::Admin);
        let entries = session.to_entries();
        assert_eq!(entries.get(LOGGED_IN_KEY).unwrap(), "true");
        assert_eq!(entries.get(ROLE_KEY).unwrap(), "admin");
        assert_eq!(Session::from_entries(&entries), session);
    }

    #[test]
    fn test_logged_out_writes_nothing() {
        assert!(Session::default().to_entries().is_empty());
    }

    #[test]
    fn test_unrecognised_values_restore_safely() {
        let mut entries = HashMap::new();
        entries.insert(LOGGED_IN_KEY.to_string(), "yes".to_string());
        entries.insert(ROLE_KEY.to_string(), "admin".to_string());
        assert_eq!(Session::from_entries(&entries), Session::default());

        entries.insert(LOGGED_IN_KEY.to_string(), "true".to_string());
        entries.insert(ROLE_KEY.to_string(), "".to_string());
        let restored = Session::from_entries(&entries);
        assert!(restored.logged_in);
        assert_eq!(restored.active_role(), None);
    }
}
