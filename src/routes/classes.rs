use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::users::entities::UserRole;
use crate::services::ClassService;

// 懒加载的全局 ClassService 实例
static CLASS_SERVICE: Lazy<ClassService> = Lazy::new(ClassService::new_lazy);

// HTTP处理程序
pub async fn list_for_teacher(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_for_teacher(&req).await
}

pub async fn list_for_student(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_for_student(&req).await
}

pub async fn list_all(req: HttpRequest) -> ActixResult<HttpResponse> {
    CLASS_SERVICE.list_all(&req).await
}

// 配置路由
pub fn configure_classes_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/classes")
            .wrap(middlewares::RequireJWT)
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
                web::resource("/all").route(
                    web::get()
                        .to(list_all)
                        .wrap(middlewares::RequireRole::new(&UserRole::Admin)),
                ),
            ),
    );
}
