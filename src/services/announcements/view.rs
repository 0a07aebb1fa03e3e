use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AnnouncementService;
use crate::{
    middlewares::RequireJWT,
    models::{ApiResponse, ErrorCode, announcements::entities::ScopingPolicy},
};

// 学生标记公告已查看。
// 首次标记与重复标记都返回 200，消息区分两种情况；
// 并发重复请求由存储层唯一约束裁决，最多一条回执落库。
pub async fn handle_mark_viewed(
    service: &AnnouncementService,
    request: &HttpRequest,
    announcement_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let Some(student_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Authentication required",
        )));
    };

    // 目标公告必须存在
    let announcement = match storage.get_announcement_by_id(announcement_id).await {
        Ok(Some(announcement)) => announcement,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::AnnouncementNotFound,
                "Announcement not found",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::AnnouncementViewFailed,
                    format!("Failed to load announcement: {e}"),
                )),
            );
        }
    };

    // 旧策略下仅所选班级的公告可标记；broadcast 不做选课校验
    if service.scoping_policy() == ScopingPolicy::EnrollmentFiltered {
        let enrolled = match storage.list_classes_by_student(student_id).await {
            Ok(classes) => classes.iter().any(|c| c.id == announcement.class_id),
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::AnnouncementViewFailed,
                        format!("Failed to check enrollment: {e}"),
                    )),
                );
            }
        };
        if !enrolled {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::AnnouncementPermissionDenied,
                "You are not enrolled in this announcement's class",
            )));
        }
    }

    match storage
        .mark_announcement_viewed(announcement_id, student_id)
        .await
    {
        Ok(true) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_empty("Announcement marked as viewed"))),
        Ok(false) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Announcement already viewed")))
        }
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::AnnouncementViewFailed,
                format!("Failed to mark announcement as viewed: {e}"),
            )),
        ),
    }
}
