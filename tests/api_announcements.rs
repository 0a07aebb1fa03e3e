//! 公告接口集成测试
//!
//! 使用内存存储与内存附件后端，通过完整的 actix App 走一遍
//! 认证、角色门禁、发布、列表、查看回执与删除流程。

use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use serde_json::Value;

use rust_sshs_portal::attachments::{AttachmentStore, memory::MemoryAttachmentStore};
use rust_sshs_portal::cache::{ObjectCache, object_cache::moka::MokaCacheWrapper};
use rust_sshs_portal::models::announcements::requests::NewAnnouncement;
use rust_sshs_portal::models::users::entities::UserRole;
use rust_sshs_portal::models::users::requests::CreateUserRequest;
use rust_sshs_portal::routes;
use rust_sshs_portal::storage::{Storage, memory_storage::MemoryStorage};
use rust_sshs_portal::utils::jwt::JwtUtils;
use rust_sshs_portal::utils::password::hash_password;

struct TestContext {
    storage: Arc<MemoryStorage>,
    attachments: Arc<MemoryAttachmentStore>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            attachments: Arc::new(MemoryAttachmentStore::new()),
        }
    }

    async fn seed_user(&self, full_name: &str, email: &str, role: UserRole) -> (i64, String) {
        let user = self
            .storage
            .create_user(CreateUserRequest {
                full_name: full_name.to_string(),
                email: email.to_string(),
                password: hash_password("Portal1234").unwrap(),
                role: role.clone(),
                address: None,
            })
            .await
            .unwrap();
        let token = JwtUtils::generate_access_token(user.id, &role.to_string()).unwrap();
        (user.id, token)
    }

    // 直接种一条带真实附件对象的公告
    async fn seed_announcement(&self, teacher_id: i64, class_id: i64, title: &str) -> i64 {
        let stored = self
            .attachments
            .upload(&format!("announcements/{teacher_id}"), b"%PDF-1.7".to_vec())
            .await
            .unwrap();
        self.storage
            .create_announcement(NewAnnouncement {
                title: title.to_string(),
                class_id,
                teacher_id,
                file_url: stored.url,
            })
            .await
            .unwrap()
            .id
    }
}

macro_rules! test_app {
    ($ctx:expr) => {{
        let storage: Arc<dyn Storage> = $ctx.storage.clone();
        let attachments: Arc<dyn AttachmentStore> = $ctx.attachments.clone();
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new().unwrap());
        test::init_service(
            App::new()
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(cache))
                .app_data(web::Data::new(attachments))
                .configure(routes::configure_auth_routes)
                .configure(routes::configure_classes_routes)
                .configure(routes::configure_announcements_routes),
        )
        .await
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    file: Option<&[u8]>,
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(data) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notice.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

const BOUNDARY: &str = "----portal-test-boundary";

#[actix_web::test]
async fn test_requests_without_token_are_rejected() {
    let ctx = TestContext::new();
    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/announcements/student")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_and_list_announcements() {
    let ctx = TestContext::new();
    let (teacher_id, _) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    ctx.seed_announcement(teacher_id, class.id, "Welcome back").await;

    let app = test_app!(ctx);

    // 登录拿 access token
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(serde_json::json!({
                "email": "t1@school.edu",
                "password": "Portal1234",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    // 用它查教师视图列表
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/announcements/teacher")
            .insert_header(bearer(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Welcome back");
    assert_eq!(items[0]["view_count"], 0);
}

#[actix_web::test]
async fn test_teacher_posts_announcement_via_multipart() {
    let ctx = TestContext::new();
    let (teacher_id, token) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();

    let app = test_app!(ctx);

    let body = multipart_body(
        BOUNDARY,
        &[("title", "Exam schedule"), ("class_id", &class.id.to_string())],
        Some(b"%PDF-1.4 exam"),
    );
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/announcements")
            .insert_header(bearer(&token))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Announcement posted successfully");
    assert_eq!(body["data"]["teacher_id"], teacher_id);
    assert_eq!(body["data"]["class_id"], class.id);

    // 附件确实进了对象存储
    assert_eq!(ctx.attachments.object_count(), 1);
}

#[actix_web::test]
async fn test_create_rejects_missing_title_before_upload() {
    let ctx = TestContext::new();
    let (teacher_id, token) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();

    let app = test_app!(ctx);

    let body = multipart_body(
        BOUNDARY,
        &[("class_id", &class.id.to_string())],
        Some(b"%PDF-1.4 exam"),
    );
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/announcements")
            .insert_header(bearer(&token))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // 校验失败时不触发上传
    assert_eq!(ctx.attachments.object_count(), 0);
}

#[actix_web::test]
async fn test_create_rejects_non_pdf_file() {
    let ctx = TestContext::new();
    let (teacher_id, token) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();

    let app = test_app!(ctx);

    let body = multipart_body(
        BOUNDARY,
        &[("title", "Nope"), ("class_id", &class.id.to_string())],
        Some(b"PK\x03\x04zipfile"),
    );
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/announcements")
            .insert_header(bearer(&token))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.attachments.object_count(), 0);
}

#[actix_web::test]
async fn test_student_cannot_post_announcement() {
    let ctx = TestContext::new();
    let (_, token) = ctx.seed_user("Student One", "s1@school.edu", UserRole::Student).await;

    let app = test_app!(ctx);

    let body = multipart_body(BOUNDARY, &[("title", "Hi"), ("class_id", "1")], Some(b"%PDF-1.4"));
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/announcements")
            .insert_header(bearer(&token))
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_list_endpoints_reject_other_roles() {
    let ctx = TestContext::new();
    let (_, student_token) = ctx.seed_user("Student One", "s1@school.edu", UserRole::Student).await;
    let (_, teacher_token) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;

    let app = test_app!(ctx);

    for (uri, token) in [
        ("/api/v1/announcements/admin", &student_token),
        ("/api/v1/announcements/teacher", &student_token),
        ("/api/v1/announcements/student", &teacher_token),
        ("/api/v1/classes/all", &teacher_token),
    ] {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[actix_web::test]
async fn test_student_marks_announcement_viewed_idempotently() {
    let ctx = TestContext::new();
    let (teacher_id, _) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let (_, student_token) = ctx.seed_user("Student One", "s1@school.edu", UserRole::Student).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    let announcement_id = ctx.seed_announcement(teacher_id, class.id, "Field trip").await;

    let app = test_app!(ctx);

    let uri = format!("/api/v1/announcements/{announcement_id}/view");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&student_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Announcement marked as viewed");

    // 重复标记不是错误
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer(&student_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Announcement already viewed");

    assert_eq!(
        ctx.storage.count_announcement_views(announcement_id).await.unwrap(),
        1
    );
}

#[actix_web::test]
async fn test_mark_viewed_unknown_announcement_is_404() {
    let ctx = TestContext::new();
    let (_, student_token) = ctx.seed_user("Student One", "s1@school.edu", UserRole::Student).await;

    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/announcements/999/view")
            .insert_header(bearer(&student_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_teacher_cannot_mark_viewed() {
    let ctx = TestContext::new();
    let (teacher_id, teacher_token) =
        ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    let announcement_id = ctx.seed_announcement(teacher_id, class.id, "Field trip").await;

    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/announcements/{announcement_id}/view"))
            .insert_header(bearer(&teacher_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_teacher_cannot_delete_anothers_announcement() {
    let ctx = TestContext::new();
    let (owner_id, _) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let (_, other_token) = ctx.seed_user("Teacher Two", "t2@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", owner_id).unwrap();
    let announcement_id = ctx.seed_announcement(owner_id, class.id, "Field trip").await;

    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/announcements/{announcement_id}"))
            .insert_header(bearer(&other_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(
        ctx.storage
            .get_announcement_by_id(announcement_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[actix_web::test]
async fn test_admin_delete_removes_attachment_and_row() {
    let ctx = TestContext::new();
    let (teacher_id, _) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let (_, admin_token) = ctx.seed_user("Admin", "a@school.edu", UserRole::Admin).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    let announcement_id = ctx.seed_announcement(teacher_id, class.id, "Field trip").await;
    assert_eq!(ctx.attachments.object_count(), 1);

    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/announcements/{announcement_id}"))
            .insert_header(bearer(&admin_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(
        ctx.storage
            .get_announcement_by_id(announcement_id)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(ctx.attachments.object_count(), 0);
}

#[actix_web::test]
async fn test_remote_delete_failure_keeps_row_intact() {
    let ctx = TestContext::new();
    let (teacher_id, teacher_token) =
        ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    let announcement_id = ctx.seed_announcement(teacher_id, class.id, "Field trip").await;

    ctx.attachments.set_fail_deletes(true);

    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/announcements/{announcement_id}"))
            .insert_header(bearer(&teacher_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // 远端删除失败后公告行必须原样保留
    assert!(
        ctx.storage
            .get_announcement_by_id(announcement_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[actix_web::test]
async fn test_class_listing_is_role_scoped() {
    let ctx = TestContext::new();
    let (teacher_id, teacher_token) =
        ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let (student_id, student_token) =
        ctx.seed_user("Student One", "s1@school.edu", UserRole::Student).await;
    let (_, admin_token) = ctx.seed_user("Admin", "a@school.edu", UserRole::Admin).await;

    let own = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    let other = ctx.storage.insert_class("Grade 3-B", teacher_id + 1000).unwrap();
    ctx.storage.enroll(student_id, other.id).unwrap();

    let app = test_app!(ctx);

    for (uri, token, expected_ids) in [
        ("/api/v1/classes/teacher", &teacher_token, vec![own.id]),
        ("/api/v1/classes/student", &student_token, vec![other.id]),
        ("/api/v1/classes/all", &admin_token, vec![own.id, other.id]),
    ] {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(uri)
                .insert_header(bearer(token))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let ids: Vec<i64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, expected_ids);
    }
}

#[actix_web::test]
async fn test_student_list_carries_view_state() {
    let ctx = TestContext::new();
    let (teacher_id, _) = ctx.seed_user("Teacher One", "t1@school.edu", UserRole::Teacher).await;
    let (_, student_token) = ctx.seed_user("Student One", "s1@school.edu", UserRole::Student).await;
    let class = ctx.storage.insert_class("Grade 3-A", teacher_id).unwrap();
    let first = ctx.seed_announcement(teacher_id, class.id, "First").await;
    let _second = ctx.seed_announcement(teacher_id, class.id, "Second").await;

    let app = test_app!(ctx);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/announcements/{first}/view"))
            .insert_header(bearer(&student_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/announcements/student")
            .insert_header(bearer(&student_token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // 最新的排在最前
    assert_eq!(items[0]["title"], "Second");
    assert_eq!(items[0]["is_viewed"], false);
    assert_eq!(items[1]["title"], "First");
    assert_eq!(items[1]["is_viewed"], true);
}
