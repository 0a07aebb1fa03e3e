pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

pub struct ClassService {
    storage: Option<Arc<dyn Storage>>,
}

impl ClassService {
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

    // 教师名下的班级
    pub async fn list_for_teacher(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_for_teacher(self, request).await
    }

    // 学生所选的班级
    pub async fn list_for_student(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_for_student(self, request).await
    }

    // 全部班级（管理员）
    pub async fn list_all(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::handle_list_all(self, request).await
    }
}
