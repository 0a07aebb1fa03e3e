//! 缓存子系统
//!
//! 当前内建 moka 内存缓存，后端按 `cache.type` 配置选择。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 按配置创建对象缓存
pub async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    register::debug_object_cache_registry();

    let config = AppConfig::get();
    let constructor = register::get_object_cache_plugin(&config.cache.cache_type).ok_or_else(
        || {
            PortalError::cache_plugin_not_found(format!(
                "no cache plugin named '{}'",
                config.cache.cache_type
            ))
        },
    )?;

    let cache = constructor().await?;
    Ok(Arc::from(cache))
}
