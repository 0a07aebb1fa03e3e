//! 请求参数解析错误处理
//!
//! 将 actix 的 JSON / Query 反序列化错误转换为统一响应格式。

use actix_web::{HttpRequest, HttpResponse, error::Error};

use crate::models::{ApiResponse, ErrorCode};

pub fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> Error {
    let detail = err.to_string();
    actix_web::error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
            ErrorCode::BadRequest,
            format!("Invalid JSON payload: {detail}"),
        )),
    )
    .into()
}

pub fn query_error_handler(err: actix_web::error::QueryPayloadError, _req: &HttpRequest) -> Error {
    let detail = err.to_string();
    actix_web::error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
            ErrorCode::BadRequest,
            format!("Invalid query parameters: {detail}"),
        )),
    )
    .into()
}
