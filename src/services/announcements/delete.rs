use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AnnouncementService;
use crate::{
    attachments::object_id_from_url,
    middlewares::RequireJWT,
    models::{
        ApiResponse, ErrorCode, announcements::entities::Announcement, users::entities::UserRole,
    },
};

// 删除顺序固定：先删远端附件，成功后再删数据行。
// 远端删除失败则整个操作以 500 结束，公告行保持完整；
// 行删除失败时不恢复已删除的附件（不做补偿）。
pub async fn handle_delete(
    service: &AnnouncementService,
    request: &HttpRequest,
    announcement_id: i64,
) -> ActixResult<HttpResponse> {
    let role = RequireJWT::extract_user_role(request);
    let storage = service.get_storage(request);

    let uid = match RequireJWT::extract_user_id(request) {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "Unauthorized: missing user id",
            )));
        }
    };

    // 查询公告信息
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
                    ErrorCode::InternalServerError,
                    format!("Failed to get announcement information: {e}"),
                )),
            );
        }
    };

    // 权限校验
    if let Err(resp) = check_announcement_delete_permission(role, uid, &announcement) {
        return Ok(resp);
    }

    // 先删远端附件
    let attachments = service.get_attachments(request);
    let object_id = object_id_from_url(&announcement.file_url, announcement.teacher_id);
    if let Err(e) = attachments.delete(&object_id).await {
        tracing::error!(
            "Remote attachment delete failed for announcement {}: {}",
            announcement_id,
            e
        );
        return Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::AnnouncementDeleteFailed,
                "Failed to delete announcement attachment",
            )),
        );
    }

    // 再删数据行
    match storage.delete_announcement(announcement_id).await {
        Ok(true) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success_empty("Announcement deleted successfully"))),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::AnnouncementNotFound,
            "Announcement not found",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::AnnouncementDeleteFailed,
                format!("Announcement deletion failed: {e}"),
            )),
        ),
    }
}

/// 权限校验辅助函数：管理员可删任意公告，教师仅可删自己发布的
fn check_announcement_delete_permission(
    role: Option<UserRole>,
    uid: i64,
    announcement: &Announcement,
) -> Result<(), HttpResponse> {
    match role {
        Some(UserRole::Admin) => Ok(()),
        Some(UserRole::Teacher) => {
            if announcement.teacher_id != uid {
                Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::AnnouncementPermissionDenied,
                    "You do not have permission to delete another teacher's announcement",
                )))
            } else {
                Ok(())
            }
        }
        _ => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AnnouncementPermissionDenied,
            "You do not have permission to delete this announcement",
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announcement_of(teacher_id: i64) -> Announcement {
        Announcement {
            id: 1,
            title: "Exam schedule".to_string(),
            file_url: "http://localhost:8080/uploads/announcements/7/1-x.pdf".to_string(),
            teacher_id,
            class_id: 2,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_admin_can_delete_any_announcement() {
        let ann = announcement_of(7);
        assert!(check_announcement_delete_permission(Some(UserRole::Admin), 99, &ann).is_ok());
    }

    #[test]
    fn test_teacher_can_delete_own_announcement() {
        let ann = announcement_of(7);
        assert!(check_announcement_delete_permission(Some(UserRole::Teacher), 7, &ann).is_ok());
    }

    #[test]
    fn test_teacher_cannot_delete_others_announcement() {
        let ann = announcement_of(7);
        assert!(check_announcement_delete_permission(Some(UserRole::Teacher), 8, &ann).is_err());
    }

    #[test]
    fn test_student_cannot_delete() {
        let ann = announcement_of(7);
        assert!(check_announcement_delete_permission(Some(UserRole::Student), 7, &ann).is_err());
    }

    #[test]
    fn test_missing_role_rejected() {
        let ann = announcement_of(7);
        assert!(check_announcement_delete_permission(None, 7, &ann).is_err());
    }
}
