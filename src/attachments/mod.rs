//! 附件对象存储抽象
//!
//! 公告附件存放在独立的对象存储中，数据库仅保留下载 URL。
//! 对象 ID 规则：`announcements/{teacher_id}/{stem}`，其中 stem
//! 取 URL 最后一个路径段去掉扩展名，删除时据此定位远端对象。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};

pub mod local_fs;
pub mod memory;

/// 一次上传的结果
#[derive(Debug, Clone)]
pub struct StoredAttachment {
    /// 对象存储内的唯一标识，删除时使用
    pub object_id: String,
    /// 公开下载 URL，落库到公告行
    pub url: String,
}

/// 附件后端接口
#[async_trait::async_trait]
pub trait AttachmentStore: Send + Sync {
    /// 上传附件，folder 形如 `announcements/{teacher_id}`
    async fn upload(&self, folder: &str, data: Vec<u8>) -> Result<StoredAttachment>;

    /// 删除远端对象；对象不存在视为成功（删除是幂等的）
    async fn delete(&self, object_id: &str) -> Result<()>;
}

/// 从下载 URL 反推对象 ID
///
/// 取最后一个路径段、去掉扩展名，再拼上发布者目录。
pub fn object_id_from_url(file_url: &str, teacher_id: i64) -> String {
    let last_segment = file_url.rsplit('/').next().unwrap_or(file_url);
    let stem = last_segment
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(last_segment);
    format!("announcements/{teacher_id}/{stem}")
}

/// 根据配置创建附件后端
pub fn create_attachment_store() -> Result<Arc<dyn AttachmentStore>> {
    let config = AppConfig::get();
    match config.upload.backend.as_str() {
        "local" => Ok(Arc::new(local_fs::LocalFsAttachmentStore::new(
            &config.upload.dir,
            &config.upload.public_base_url,
        ))),
        "memory" => Ok(Arc::new(memory::MemoryAttachmentStore::new())),
        other => Err(PortalError::attachment_operation(format!(
            "unknown upload backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_from_url() {
        let url = "http://localhost:8080/uploads/announcements/7/1718000000-abc123.pdf";
        assert_eq!(
            object_id_from_url(url, 7),
            "announcements/7/1718000000-abc123"
        );
    }

    #[test]
    fn test_object_id_without_extension() {
        assert_eq!(
            object_id_from_url("https://cdn.example.com/x/report", 3),
            "announcements/3/report"
        );
    }

    #[test]
    fn test_object_id_bare_name() {
        assert_eq!(object_id_from_url("notice.pdf", 1), "announcements/1/notice");
    }
}
