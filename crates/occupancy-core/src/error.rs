//! 错误定义模块

use thiserror::Error;

/// 占用率系统统一错误类型
#[derive(Error, Debug)]
pub enum OccupancyError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("后端返回错误 ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("认证错误: {0}")]
    Auth(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("床位容量无效: 机构 {facility} 的容量为 0")]
    InvalidCapacity { facility: String },

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("工作流错误: {0}")]
    Workflow(String),

    #[error("无效状态转换: 从 {from} 到 {event}")]
    InvalidStateTransition { from: String, event: String },

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl OccupancyError {
    /// 错误分类名称，用于对外的 JSON 错误体
    pub fn kind(&self) -> &'static str {
        match self {
            OccupancyError::Config(_) => "config",
            OccupancyError::Network(_) | OccupancyError::Backend { .. } => "network",
            OccupancyError::Serialization(_) => "serialization",
            OccupancyError::Validation(_) => "validation",
            OccupancyError::Auth(_) => "auth",
            OccupancyError::NotFound(_) => "not_found",
            OccupancyError::InvalidCapacity { .. } => "invalid_capacity",
            OccupancyError::Storage(_) | OccupancyError::Io(_) => "storage",
            OccupancyError::Workflow(_) | OccupancyError::InvalidStateTransition { .. } => {
                "workflow"
            }
            OccupancyError::Internal(_) => "internal",
        }
    }

    /// 面向用户的提示信息（不带分类前缀）
    pub fn user_message(&self) -> String {
        match self {
            OccupancyError::Config(msg)
            | OccupancyError::Network(msg)
            | OccupancyError::Validation(msg)
            | OccupancyError::Auth(msg)
            | OccupancyError::NotFound(msg)
            | OccupancyError::Storage(msg)
            | OccupancyError::Workflow(msg)
            | OccupancyError::Internal(msg) => msg.clone(),
            OccupancyError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// 占用率系统统一结果类型
pub type Result<T> = std::result::Result<T, OccupancyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_network_failures() {
        assert_eq!(OccupancyError::Network("timeout".into()).kind(), "network");
        let backend = OccupancyError::Backend {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(backend.kind(), "network");
        assert_eq!(backend.user_message(), "boom");
    }

    #[test]
    fn test_user_message_strips_prefix() {
        let err = OccupancyError::Auth("Invalid username or password".into());
        assert_eq!(err.user_message(), "Invalid username or password");
        assert!(err.to_string().contains("Invalid username or password"));
    }
}
