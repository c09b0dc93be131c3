//! 视图数据加载状态机
//!
//! 每个视图挂载时创建一个 `ViewLoader`，其取消令牌是服务器关闭令牌的子令牌。
//! 视图卸载（或被丢弃）后，尚未返回的请求结果会被丢弃，不会写回视图状态。

use occupancy_core::{OccupancyError, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// 视图数据状态：`Idle → Loading → {Loaded | Failed}`
#[derive(Debug)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(OccupancyError),
}

impl<T> LoadState<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    /// 转换为结果；未完成的加载视为视图已卸载
    pub fn into_result(self) -> Result<T> {
        match self {
            LoadState::Loaded(data) => Ok(data),
            LoadState::Failed(err) => Err(err),
            LoadState::Idle | LoadState::Loading => Err(OccupancyError::Workflow(
                "The view was closed before its data arrived".to_string(),
            )),
        }
    }
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

/// 绑定视图生命周期的加载器
#[derive(Debug)]
pub struct ViewLoader {
    view: &'static str,
    token: CancellationToken,
}

impl ViewLoader {
    /// 挂载视图
    pub fn mount(view: &'static str, parent: &CancellationToken) -> Self {
        debug!("Mounting view {}", view);
        Self {
            view,
            token: parent.child_token(),
        }
    }

    pub fn view(&self) -> &'static str {
        self.view
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// 卸载视图，取消所有未完成的加载
    pub fn unmount(&self) {
        self.token.cancel();
    }

    /// 执行一次加载；视图在完成前被卸载时返回 `Idle`
    pub async fn load<T, F>(&self, fetch: F) -> LoadState<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.token.is_cancelled() {
            return LoadState::Idle;
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                warn!("View {} unmounted, discarding in-flight load", self.view);
                LoadState::Idle
            }
            result = fetch => match result {
                Ok(data) => LoadState::Loaded(data),
                Err(err) => {
                    error!("Error loading data for {}: {}", self.view, err);
                    LoadState::Failed(err)
                }
            },
        }
    }
}

impl Drop for ViewLoader {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
