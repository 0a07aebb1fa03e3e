use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ClassService;
use crate::{
    errors::PortalError,
    middlewares::RequireJWT,
    models::{ApiResponse, ErrorCode, classes::entities::Class},
};

// 只读查询：教师见自己名下的班级，学生见所选班级，管理员见全部

pub async fn handle_list_for_teacher(
    service: &ClassService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return unauthorized();
    };

    respond(storage.list_classes_by_teacher(user.id).await)
}

pub async fn handle_list_for_student(
    service: &ClassService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return unauthorized();
    };

    respond(storage.list_classes_by_student(user.id).await)
}

pub async fn handle_list_all(
    service: &ClassService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    respond(storage.list_all_classes().await)
}

fn respond(result: Result<Vec<Class>, PortalError>) -> ActixResult<HttpResponse> {
    match result {
        Ok(classes) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(classes, "Classes retrieved successfully"))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("Failed to retrieve classes: {e}"),
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
