use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::services::AnnouncementService;
use crate::utils::SafeAnnouncementIdI64;

// 懒加载的全局 AnnouncementService 实例
static ANNOUNCEMENT_SERVICE: Lazy<AnnouncementService> = Lazy::new(AnnouncementService::new_lazy);

// HTTP处理程序
pub async fn create_announcement(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.create_announcement(&req, payload).await
}

pub async fn list_for_teacher(req: HttpRequest) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.list_for_teacher(&req).await
}

pub async fn list_for_student(req: HttpRequest) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.list_for_student(&req).await
}

pub async fn list_for_admin(req: HttpRequest) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.list_for_admin(&req).await
}

pub async fn mark_viewed(
    req: HttpRequest,
    announcement_id: SafeAnnouncementIdI64,
) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE.mark_viewed(&req, announcement_id.0).await
}

pub async fn delete_announcement(
    req: HttpRequest,
    announcement_id: SafeAnnouncementIdI64,
) -> ActixResult<HttpResponse> {
    ANNOUNCEMENT_SERVICE
        .delete_announcement(&req, announcement_id.0)
        .await
}

// 配置路由
// 静态路径段必须先于 /{announcement_id} 注册
pub fn configure_announcements_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/announcements")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(
                    web::post()
                        .to(create_announcement)
                        // 教师发布公告，管理员也可代发
                        .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles())),
                ),
            )
            .service(
                web::resource("/teacher").route(
                    web::get()
                        .to(list_for_teacher)
                        .wrap(middlewares::RequireRole::new(&UserRole::Teacher)),
                ),
            )
            .service(
                web::resource("/student").route(
                    web::get()
                        .to(list_for_student)
                        .wrap(middlewares::RequireRole::new(&UserRole::Student)),
                ),
            )
            .service(
                web::resource("/admin").route(
                    web::get()
                        .to(list_for_admin)
                        .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
                ),
            )
            .service(
                web::resource("/{announcement_id}/view").route(
                    web::post()
                        .to(mark_viewed)
                        // 查看回执只属于学生
                        .wrap(middlewares::RequireRole::new(&UserRole::Student)),
                ),
            )
            .service(
                web::resource("/{announcement_id}").route(
                    web::delete()
                        .to(delete_announcement)
                        // 删除权限在 handler 内再做属主校验
                        .wrap(middlewares::RequireRole::new_any(UserRole::staff_roles())),
                ),
            ),
    );
}
