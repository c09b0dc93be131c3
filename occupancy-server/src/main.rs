//! 床位占用看板服务主程序

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use occupancy_client::HttpBackend;
use occupancy_web::{AppState, FileStorage, SessionStore, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::AppConfig;

/// 看板服务命令行参数
#[derive(Parser, Debug)]
#[command(name = "occupancy-server")]
#[command(about = "医院床位占用率预测系统的视图服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 预测后端根地址
    #[arg(short, long)]
    backend_url: Option<String>,

    /// 会话文件路径
    #[arg(short, long)]
    session_file: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,

    /// 打印生效的配置后退出
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.clone();
        }
        if let Some(file) = &self.session_file {
            config.session.file = file.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(config.logging.level.as_str())
        .init();

    info!("{}", AppConfig::source_summary(args.config.as_deref()));
    info!("启动床位占用看板服务...");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  后端地址: {}", config.backend.base_url);
    info!("  会话文件: {}", config.session.file);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let backend = Arc::new(HttpBackend::new(config.backend.clone())?);
    let storage = Arc::new(FileStorage::new(&config.session.file));
    let session = Arc::new(SessionStore::restore(storage).await?);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    let state = AppState::new(backend, session, config.views.clone(), shutdown);
    if let Err(e) = WebServer::new(addr, state).run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
