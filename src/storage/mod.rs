use std::sync::Arc;

use crate::models::{
    announcements::{
        entities::{Announcement, ScopingPolicy},
        requests::NewAnnouncement,
        responses::{AnnouncementListItem, StudentAnnouncementListItem},
    },
    classes::entities::Class,
    users::{
        entities::User,
        requests::{CreateUserRequest, UpdateProfileRequest},
    },
};

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};

pub mod memory_storage;
pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段须已哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 更新用户资料（仅邮箱/密码哈希/地址）
    async fn update_profile(&self, id: i64, update: UpdateProfileRequest) -> Result<Option<User>>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 统计用户总数（用于首次启动播种管理员）
    async fn count_users(&self) -> Result<u64>;

    /// 班级查询方法（本系统内班级只读）
    // 教师名下的班级
    async fn list_classes_by_teacher(&self, teacher_id: i64) -> Result<Vec<Class>>;
    // 学生所选的班级（经 enrollments）
    async fn list_classes_by_student(&self, student_id: i64) -> Result<Vec<Class>>;
    // 全部班级（管理员）
    async fn list_all_classes(&self) -> Result<Vec<Class>>;
    // 通过ID获取班级
    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>>;

    /// 公告管理方法
    // 入库公告（附件上传已完成，file_url 非空）
    async fn create_announcement(&self, announcement: NewAnnouncement) -> Result<Announcement>;
    // 通过ID获取公告
    async fn get_announcement_by_id(&self, id: i64) -> Result<Option<Announcement>>;
    // 教职员视图列表：teacher_id 为 None 表示管理员视角。
    // 按创建时间倒序（同刻按 id 倒序保证稳定全序）。
    async fn list_announcements_for_staff(
        &self,
        policy: ScopingPolicy,
        teacher_id: Option<i64>,
    ) -> Result<Vec<AnnouncementListItem>>;
    // 学生视图列表：附该学生自己的查看状态
    async fn list_announcements_for_student(
        &self,
        policy: ScopingPolicy,
        student_id: i64,
    ) -> Result<Vec<StudentAnnouncementListItem>>;
    // 删除公告行（附件删除由服务层先行完成）
    async fn delete_announcement(&self, id: i64) -> Result<bool>;

    /// 查看回执方法
    // 幂等标记：返回 true 表示新写入，false 表示回执已存在。
    // 唯一性由存储层约束保证，并发调用不会产生重复行或报错。
    async fn mark_announcement_viewed(&self, announcement_id: i64, student_id: i64)
    -> Result<bool>;
    // 公告的查看人数
    async fn count_announcement_views(&self, announcement_id: i64) -> Result<i64>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let config = AppConfig::get();
    if config.database.url == "memory://" {
        return Ok(Arc::new(memory_storage::MemoryStorage::new()));
    }
    if config.database.url.is_empty() {
        return Err(PortalError::storage_plugin_not_found(
            "database.url is empty",
        ));
    }
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
