//! 本地文件系统附件后端
//!
//! 对象落盘在 `{dir}/{object_id}.pdf`，下载 URL 由
//! `{public_base_url}/{folder}/{stored_name}` 拼接而成。

use std::path::PathBuf;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{AttachmentStore, StoredAttachment};
use crate::errors::{PortalError, Result};

pub struct LocalFsAttachmentStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFsAttachmentStore {
    pub fn new(dir: &str, public_base_url: &str) -> Self {
        Self {
            root: PathBuf::from(dir),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, object_id: &str) -> PathBuf {
        self.root.join(format!("{object_id}.pdf"))
    }
}

#[async_trait::async_trait]
impl AttachmentStore for LocalFsAttachmentStore {
    async fn upload(&self, folder: &str, data: Vec<u8>) -> Result<StoredAttachment> {
        let stem = format!(
            "{}-{}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4().simple()
        );
        let stored_name = format!("{stem}.pdf");
        let object_id = format!("{folder}/{stem}");

        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortalError::attachment_operation(format!("创建附件目录失败: {e}")))?;

        let path = dir.join(&stored_name);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| PortalError::attachment_operation(format!("写入附件失败: {e}")))?;

        debug!("Attachment stored at {}", path.display());

        Ok(StoredAttachment {
            url: format!("{}/{folder}/{stored_name}", self.public_base_url),
            object_id,
        })
    }

    async fn delete(&self, object_id: &str) -> Result<()> {
        let path = self.object_path(object_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // 对象已不存在——幂等删除
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Attachment {} already absent, skipping", object_id);
                Ok(())
            }
            Err(e) => Err(PortalError::attachment_operation(format!(
                "删除附件失败: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_delete() {
        let dir = std::env::temp_dir().join(format!("portal-attach-{}", Uuid::new_v4()));
        let store = LocalFsAttachmentStore::new(
            dir.to_str().unwrap(),
            "http://localhost:8080/uploads/",
        );

        let stored = store
            .upload("announcements/1", b"%PDF-1.4 test".to_vec())
            .await
            .unwrap();
        assert!(stored.url.starts_with("http://localhost:8080/uploads/announcements/1/"));
        assert!(stored.url.ends_with(".pdf"));
        assert!(store.object_path(&stored.object_id).exists());

        store.delete(&stored.object_id).await.unwrap();
        assert!(!store.object_path(&stored.object_id).exists());

        // 重复删除不报错
        store.delete(&stored.object_id).await.unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
