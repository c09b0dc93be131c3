//! 配置管理
//!
//! 配置按以下顺序叠加：内置默认值、可选的 TOML 文件、`OCCUPANCY__*` 环境变量。
//! 命令行参数最后覆盖。

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use occupancy_client::BackendConfig;
use occupancy_web::ViewConfig;
use serde::{Deserialize, Serialize};

/// 系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 后端连接配置
    pub backend: BackendConfig,
    /// 会话持久化配置
    pub session: SessionConfig,
    /// 页面参数
    pub views: ViewConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 会话键值文件
    pub file: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: "./data/session.json".to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别或 EnvFilter 指令
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 加载配置
    pub fn load(config_path: Option<&str>) -> Result<AppConfig> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&AppConfig::default()).context("Failed to build default configuration")?,
        );
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("OCCUPANCY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// 配置来源说明；日志初始化后由主程序输出
    pub fn source_summary(config_path: Option<&str>) -> String {
        match config_path {
            Some(path) => format!("Configuration loaded successfully from: {}", path),
            None => "Configuration loaded from defaults and environment".to_string(),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            bail!("backend.base_url must not be empty");
        }
        if self.backend.request_timeout_secs == 0 {
            bail!("backend.request_timeout_secs must be greater than 0");
        }
        if self.views.home_page_size == 0 || self.views.checkout_page_size == 0 {
            bail!("views page sizes must be greater than 0");
        }
        if self.views.forecast_horizon_days < 0 {
            bail!("views.forecast_horizon_days must not be negative");
        }
        if self.session.file.trim().is_empty() {
            bail!("session.file must not be empty");
        }
        Ok(())
    }

    /// 以 TOML 输出当前配置
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000/ml_model");
        assert_eq!(config.views.forecast_horizon_days, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("occupancy-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[server]\nport = 8081\n\n[backend]\nbase_url = \"http://backend:8000/ml_model\"").unwrap();
        drop(file);

        let config = AppConfig::load(path.to_str()).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.backend.base_url, "http://backend:8000/ml_model");
        assert_eq!(config.backend.api_prefix, "/api");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_validation_and_printing() {
        let mut config = AppConfig::default();
        config.views.home_page_size = 0;
        assert!(config.validate().is_err());

        let toml = AppConfig::default().to_toml().unwrap();
        assert!(toml.contains("[backend]"));
        assert!(toml.contains("forecast_horizon_days = 15"));
    }

    #[test]
    fn test_source_summary() {
        assert_eq!(
            AppConfig::source_summary(Some("occupancy.toml")),
            "Configuration loaded successfully from: occupancy.toml"
        );
        assert!(AppConfig::source_summary(None).contains("defaults and environment"));
    }
}
