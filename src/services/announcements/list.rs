use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AnnouncementService;
use crate::{
    errors::PortalError,
    middlewares::RequireJWT,
    models::{ApiResponse, ErrorCode},
};

// 列表视图按端点分流：
// 学生端点拿到带 is_viewed 的行；教师/管理员端点拿到带 view_count 的行。
// 排序恒为创建时间倒序（同刻按 id 倒序）。
// broadcast 策略下教师同管理员一样看全站，enrollment_filtered 时教师只看自己发布的。

pub async fn handle_list_for_admin(
    service: &AnnouncementService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let policy = service.scoping_policy();

    respond(storage.list_announcements_for_staff(policy, None).await)
}

pub async fn handle_list_for_teacher(
    service: &AnnouncementService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let policy = service.scoping_policy();

    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return unauthorized();
    };

    respond(
        storage
            .list_announcements_for_staff(policy, Some(user.id))
            .await,
    )
}

pub async fn handle_list_for_student(
    service: &AnnouncementService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let policy = service.scoping_policy();

    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return unauthorized();
    };

    respond(
        storage
            .list_announcements_for_student(policy, user.id)
            .await,
    )
}

fn respond<T: serde::Serialize>(result: Result<Vec<T>, PortalError>) -> ActixResult<HttpResponse> {
    match result {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            items,
            "Announcements retrieved successfully",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve announcements: {e}"),
            )),
        ),
    }
}

fn unauthorized() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Authentication required",
    )))
}
