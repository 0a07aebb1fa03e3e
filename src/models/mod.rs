//! 数据模型定义
//!
//! 按领域划分：每个领域的 `entities` / `requests` / `responses` 与
//! 存储层的 SeaORM 实体（`crate::entity`）分离。

pub mod announcements;
pub mod auth;
pub mod classes;
pub mod common;
pub mod users;

pub use common::error_code::ErrorCode;
pub use common::response::ApiResponse;

/// 程序启动时间，用于统计预处理耗时
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
