//! # Hospital Occupancy
//!
//! 医院床位占用率预测与看板系统的聚合入口，重新导出各子模块。

pub use occupancy_analytics;
pub use occupancy_client;
pub use occupancy_core;
