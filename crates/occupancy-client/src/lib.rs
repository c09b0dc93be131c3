//! # 后端访问模块
//!
//! 负责与预测后端交互：
//! - `BackendApi` 接口与基于 reqwest 的 `HttpBackend` 实现
//! - 与后端语义一致的内存实现 `MemoryBackend`（演示与测试使用）
//! - 视图数据加载状态机，视图卸载后丢弃迟到的结果
//! - 出院办理工作流

pub mod api;
pub mod discharge;
pub mod loader;
pub mod memory;

pub use api::{fetch_snapshot, BackendApi, BackendConfig, HttpBackend, Snapshot};
pub use discharge::{
    DischargeEntry, DischargeEvent, DischargeOutcome, DischargeResult, DischargeStateMachine,
    DischargeStatus, DischargeWorkflow,
};
pub use loader::{LoadState, ViewLoader};
pub use memory::MemoryBackend;
