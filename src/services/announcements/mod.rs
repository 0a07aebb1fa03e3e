pub mod create;
pub mod delete;
pub mod list;
pub mod view;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::attachments::AttachmentStore;
use crate::config::AppConfig;
use crate::models::announcements::entities::ScopingPolicy;
use crate::storage::Storage;

pub struct AnnouncementService {
    storage: Option<Arc<dyn Storage>>,
}

impl AnnouncementService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_attachments(&self, request: &HttpRequest) -> Arc<dyn AttachmentStore> {
        request
            .app_data::<actix_web::web::Data<Arc<dyn AttachmentStore>>>()
            .expect("Attachment store not found in app data")
            .get_ref()
            .clone()
    }

    /// 生效的可见范围策略（配置值非法时回落到 broadcast）
    pub(crate) fn scoping_policy(&self) -> ScopingPolicy {
        AppConfig::get()
            .announcements
            .scoping_policy
            .parse()
            .unwrap_or_default()
    }

    // 发布公告（multipart：title + class_id + PDF 附件）
    pub async fn create_announcement(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        create::handle_create(self, request, payload).await
    }

    // 管理员视图：全站公告，附 view_count
    pub async fn list_for_admin(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_for_admin(self, request).await
    }

    // 教师视图：形状与管理员相同
    pub async fn list_for_teacher(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_for_teacher(self, request).await
    }

    // 学生视图：附该学生的 is_viewed
    pub async fn list_for_student(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_for_student(self, request).await
    }

    // 学生标记公告已查看（幂等）
    pub async fn mark_viewed(
        &self,
        request: &HttpRequest,
        announcement_id: i64,
    ) -> ActixResult<HttpResponse> {
        view::handle_mark_viewed(self, request, announcement_id).await
    }

    // 删除公告（先删远端附件，再删数据行）
    pub async fn delete_announcement(
        &self,
        request: &HttpRequest,
        announcement_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::handle_delete(self, request, announcement_id).await
    }
}
