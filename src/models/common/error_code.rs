use serde::{Deserialize, Serialize};

/// 业务错误码
///
/// 0 表示成功；1xxx 为通用错误；2xxx 用户/认证；3xxx 公告；
/// 4xxx 附件；5xxx 班级。HTTP 状态码由各 handler 决定，
/// 此处的码仅用于响应体。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1005,
    InternalServerError = 1006,

    // 用户 / 认证
    AuthFailed = 2001,
    RegisterFailed = 2002,
    UserEmailAlreadyExists = 2003,
    UserEmailInvalid = 2004,
    UserPasswordInvalid = 2005,
    UserNotFound = 2006,
    ProfileUpdateFailed = 2007,

    // 公告
    AnnouncementNotFound = 3001,
    AnnouncementPermissionDenied = 3002,
    AnnouncementCreateFailed = 3003,
    AnnouncementDeleteFailed = 3004,
    AnnouncementViewFailed = 3005,

    // 附件
    FileUploadFailed = 4001,
    FileTypeNotAllowed = 4002,
    FileSizeExceeded = 4003,
    FileNotFound = 4004,
    FileDeleteFailed = 4005,
    MultifileUploadNotAllowed = 4006,

    // 班级
    ClassNotFound = 5001,
}
