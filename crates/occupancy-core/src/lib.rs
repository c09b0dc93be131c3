//! # Occupancy Core
//!
//! 床位占用系统的核心模块，提供基础数据结构、会话模型、错误定义和日期工具。

pub mod admission;
pub mod error;
pub mod models;
pub mod session;
pub mod utils;

pub use admission::{AdmissionField, AdmissionRequest, ReadmissionCount};
pub use error::{OccupancyError, Result};
pub use models::*;
pub use session::{Role, Session};
