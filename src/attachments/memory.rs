//! 内存附件后端
//!
//! 与 `memory://` 存储后端配套使用，也是集成测试的替身。
//! `fail_deletes` 开关可模拟远端删除失败，用于验证
//! 删除流程中断后公告行保持完整。

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use super::{AttachmentStore, StoredAttachment};
use crate::errors::{PortalError, Result};

#[derive(Default)]
pub struct MemoryAttachmentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_deletes: AtomicBool,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让后续 delete 调用全部失败（仅测试使用）
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, object_id: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(object_id))
            .unwrap_or(false)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn upload(&self, folder: &str, data: Vec<u8>) -> Result<StoredAttachment> {
        let stem = format!(
            "{}-{}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4().simple()
        );
        let object_id = format!("{folder}/{stem}");
        let url = format!("memory://attachments/{folder}/{stem}.pdf");

        self.objects
            .lock()
            .map_err(|_| PortalError::attachment_operation("attachment store lock poisoned"))?
            .insert(object_id.clone(), data);

        Ok(StoredAttachment { object_id, url })
    }

    async fn delete(&self, object_id: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PortalError::attachment_operation(
                "simulated remote delete failure",
            ));
        }

        self.objects
            .lock()
            .map_err(|_| PortalError::attachment_operation("attachment store lock poisoned"))?
            .remove(object_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_delete() {
        let store = MemoryAttachmentStore::new();
        let stored = store
            .upload("announcements/5", b"%PDF-1.7".to_vec())
            .await
            .unwrap();
        assert!(store.contains(&stored.object_id));

        store.delete(&stored.object_id).await.unwrap();
        assert!(!store.contains(&stored.object_id));
    }

    #[tokio::test]
    async fn test_fail_deletes_toggle() {
        let store = MemoryAttachmentStore::new();
        let stored = store
            .upload("announcements/5", b"%PDF-1.7".to_vec())
            .await
            .unwrap();

        store.set_fail_deletes(true);
        assert!(store.delete(&stored.object_id).await.is_err());
        // 失败后对象仍在
        assert!(store.contains(&stored.object_id));
    }
}
