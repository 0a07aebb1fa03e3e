//! 路径参数安全提取器
//!
//! 直接用 `web::Path<i64>` 提取失败时会返回 actix 默认的纯文本 400，
//! 这里的提取器保证错误也走统一的 JSON 响应格式。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        /// 从路径中提取并校验正整数 ID
        pub struct $name(pub i64);

        impl FromRequest for $name {
            type Error = actix_web::Error;
            type Future = Ready<Result<Self, Self::Error>>;

            fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
                let parsed = req
                    .match_info()
                    .get($param)
                    .and_then(|raw| raw.parse::<i64>().ok())
                    .filter(|id| *id > 0);

                ready(match parsed {
                    Some(id) => Ok($name(id)),
                    None => Err(actix_web::error::InternalError::from_response(
                        concat!("invalid path parameter: ", $param),
                        HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
                            ErrorCode::BadRequest,
                            concat!("Invalid ", $param, " in path"),
                        )),
                    )
                    .into()),
                })
            }
        }
    };
}

define_safe_i64_extractor!(SafeAnnouncementIdI64, "announcement_id");

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_valid_id_extracted() {
        let req = TestRequest::default()
            .param("announcement_id", "42")
            .to_http_request();
        let id = SafeAnnouncementIdI64::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_non_numeric_id_rejected() {
        let req = TestRequest::default()
            .param("announcement_id", "abc")
            .to_http_request();
        assert!(
            SafeAnnouncementIdI64::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }

    #[actix_web::test]
    async fn test_non_positive_id_rejected() {
        let req = TestRequest::default()
            .param("announcement_id", "0")
            .to_http_request();
        assert!(
            SafeAnnouncementIdI64::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }
}
