use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;

use super::AnnouncementService;
use crate::config::AppConfig;
use crate::middlewares::RequireJWT;
use crate::models::announcements::requests::NewAnnouncement;
use crate::models::announcements::responses::AnnouncementCreatedResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate_magic_bytes;

// multipart 解析结果
#[derive(Default)]
struct CreateForm {
    title: Option<String>,
    class_id: Option<String>,
    file: Option<Vec<u8>>,
    file_rejected: Option<HttpResponse>,
}

pub async fn handle_create(
    service: &AnnouncementService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();

    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Authentication required",
        )));
    };

    // 1. 解析 multipart 表单（文件读入内存，边读边限制大小）
    let form = match read_form(payload, config.upload.max_size).await {
        Ok(form) => form,
        Err(response) => return Ok(response),
    };
    if let Some(response) = form.file_rejected {
        return Ok(response);
    }

    // 2. 字段校验全部通过后才触发上传
    let title = match form.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "Title is required",
            )));
        }
    };

    let class_id = match form
        .class_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
    {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                "A valid class_id is required",
            )));
        }
    };

    let Some(file) = form.file else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FileNotFound,
            "A PDF attachment is required",
        )));
    };

    // 3. 上传附件到对象存储
    let attachments = service.get_attachments(request);
    let folder = format!("announcements/{user_id}");
    let stored = match attachments.upload(&folder, file).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!("Attachment upload failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::FileUploadFailed,
                    "Attachment upload failed",
                )),
            );
        }
    };

    // 4. 入库。失败时不回收已上传的附件，行为与删除流程的
    //    先远端后本地一致：宁可留下孤儿文件，不留悬空 URL。
    let storage = service.get_storage(request);
    let new_announcement = NewAnnouncement {
        title,
        class_id,
        teacher_id: user_id,
        file_url: stored.url,
    };

    match storage.create_announcement(new_announcement).await {
        Ok(announcement) => {
            tracing::info!(
                "Announcement {} posted by user {} for class {}",
                announcement.id,
                user_id,
                class_id
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                AnnouncementCreatedResponse {
                    id: announcement.id,
                    teacher_id: announcement.teacher_id,
                    class_id: announcement.class_id,
                    title: announcement.title,
                    file_url: announcement.file_url,
                },
                "Announcement posted successfully",
            )))
        }
        Err(e) => {
            tracing::error!("Announcement insert failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::AnnouncementCreateFailed,
                    format!("Failed to post announcement: {e}"),
                )),
            )
        }
    }
}

// 读取 multipart 字段；文件在流式读取时校验魔术字节与大小上限
async fn read_form(mut payload: Multipart, max_size: usize) -> Result<CreateForm, HttpResponse> {
    let mut form = CreateForm::default();

    while let Ok(Some(mut field)) = payload.try_next().await {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        match name.as_str() {
            "title" => form.title = Some(read_text_field(&mut field).await?),
            "class_id" => form.class_id = Some(read_text_field(&mut field).await?),
            "file" => {
                if form.file.is_some() {
                    form.file_rejected = Some(HttpResponse::BadRequest().json(
                        ApiResponse::error_empty(
                            ErrorCode::MultifileUploadNotAllowed,
                            "Only one file can be uploaded at a time",
                        ),
                    ));
                    return Ok(form);
                }

                let mut buffer: Vec<u8> = Vec::new();
                let mut first_chunk = true;
                while let Some(chunk) = field.next().await {
                    let data = chunk.map_err(|e| {
                        HttpResponse::BadRequest().json(ApiResponse::error_empty(
                            ErrorCode::BadRequest,
                            format!("Malformed multipart payload: {e}"),
                        ))
                    })?;

                    if first_chunk {
                        first_chunk = false;
                        if !validate_magic_bytes(&data, ".pdf") {
                            form.file_rejected = Some(HttpResponse::BadRequest().json(
                                ApiResponse::error_empty(
                                    ErrorCode::FileTypeNotAllowed,
                                    "Only PDF attachments are allowed",
                                ),
                            ));
                            return Ok(form);
                        }
                    }

                    if buffer.len() + data.len() > max_size {
                        form.file_rejected = Some(HttpResponse::BadRequest().json(
                            ApiResponse::error_empty(
                                ErrorCode::FileSizeExceeded,
                                "File size exceeds the limit",
                            ),
                        ));
                        return Ok(form);
                    }
                    buffer.extend_from_slice(&data);
                }
                form.file = Some(buffer);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text_field(field: &mut actix_multipart::Field) -> Result<String, HttpResponse> {
    let mut bytes: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| {
            HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                format!("Malformed multipart payload: {e}"),
            ))
        })?;
        bytes.extend_from_slice(&data);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
