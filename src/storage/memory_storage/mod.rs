//! 内存存储实现
//!
//! 进程内后端（`database.url = "memory://"`），同时充当测试替身。
//! 全部状态位于一把互斥锁之后，回执对的唯一性检查与写入
//! 在同一临界区内完成，与数据库唯一索引等效。

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::{PortalError, Result};
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
use crate::storage::Storage;

#[derive(Default)]
struct State {
    users: HashMap<i64, User>,
    classes: HashMap<i64, Class>,
    enrollments: HashSet<(i64, i64)>, // (student_id, class_id)
    announcements: HashMap<i64, Announcement>,
    views: HashSet<(i64, i64)>, // (announcement_id, student_id)
    next_user_id: i64,
    next_class_id: i64,
    next_announcement_id: i64,
}

pub struct MemoryStorage {
    state: Mutex<State>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_user_id: 1,
                next_class_id: 1,
                next_announcement_id: 1,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| PortalError::database_operation("memory storage lock poisoned"))
    }

    /// 直接写入一个班级（班级无 API 入口，供外部流程与测试使用）
    pub fn insert_class(&self, class_name: &str, teacher_id: i64) -> Result<Class> {
        let mut state = self.lock()?;
        let id = state.next_class_id;
        state.next_class_id += 1;
        let class = Class {
            id,
            class_name: class_name.to_string(),
            teacher_id,
            created_at: Utc::now(),
        };
        state.classes.insert(id, class.clone());
        Ok(class)
    }

    /// 直接写入一条选课记录（供外部流程与测试使用）
    pub fn enroll(&self, student_id: i64, class_id: i64) -> Result<()> {
        let mut state = self.lock()?;
        state.enrollments.insert((student_id, class_id));
        Ok(())
    }

    fn sorted_announcements(state: &State) -> Vec<Announcement> {
        let mut rows: Vec<Announcement> = state.announcements.values().cloned().collect();
        // 创建时间倒序，同刻按 id 倒序，保证稳定全序
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        rows
    }

    fn teacher_name(state: &State, teacher_id: i64) -> String {
        state
            .users
            .get(&teacher_id)
            .map(|u| u.full_name.clone())
            .unwrap_or_default()
    }

    fn class_name(state: &State, class_id: i64) -> String {
        state
            .classes
            .get(&class_id)
            .map(|c| c.class_name.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        let mut state = self.lock()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(PortalError::database_operation(format!(
                "duplicate email: {}",
                user.email
            )));
        }
        let id = state.next_user_id;
        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id,
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password,
            role: user.role,
            address: user.address,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_profile(&self, id: i64, update: UpdateProfileRequest) -> Result<Option<User>> {
        let mut state = self.lock()?;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(password_hash) = update.password {
            user.password_hash = password_hash;
        }
        if let Some(address) = update.address {
            user.address = Some(address);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        let mut state = self.lock()?;
        match state.users.get_mut(&id) {
            Some(user) => {
                user.last_login = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_users(&self) -> Result<u64> {
        Ok(self.lock()?.users.len() as u64)
    }

    async fn list_classes_by_teacher(&self, teacher_id: i64) -> Result<Vec<Class>> {
        let state = self.lock()?;
        let mut classes: Vec<Class> = state
            .classes
            .values()
            .filter(|c| c.teacher_id == teacher_id)
            .cloned()
            .collect();
        classes.sort_by_key(|c| c.id);
        Ok(classes)
    }

    async fn list_classes_by_student(&self, student_id: i64) -> Result<Vec<Class>> {
        let state = self.lock()?;
        let mut classes: Vec<Class> = state
            .classes
            .values()
            .filter(|c| state.enrollments.contains(&(student_id, c.id)))
            .cloned()
            .collect();
        classes.sort_by_key(|c| c.id);
        Ok(classes)
    }

    async fn list_all_classes(&self) -> Result<Vec<Class>> {
        let state = self.lock()?;
        let mut classes: Vec<Class> = state.classes.values().cloned().collect();
        classes.sort_by_key(|c| c.id);
        Ok(classes)
    }

    async fn get_class_by_id(&self, class_id: i64) -> Result<Option<Class>> {
        Ok(self.lock()?.classes.get(&class_id).cloned())
    }

    async fn create_announcement(&self, announcement: NewAnnouncement) -> Result<Announcement> {
        let mut state = self.lock()?;
        // 与数据库外键一致：悬空引用在此报存储错误
        if !state.classes.contains_key(&announcement.class_id) {
            return Err(PortalError::database_operation(format!(
                "foreign key violation: class {} does not exist",
                announcement.class_id
            )));
        }
        let id = state.next_announcement_id;
        state.next_announcement_id += 1;
        let announcement = Announcement {
            id,
            title: announcement.title,
            file_url: announcement.file_url,
            teacher_id: announcement.teacher_id,
            class_id: announcement.class_id,
            created_at: Utc::now(),
        };
        state.announcements.insert(id, announcement.clone());
        Ok(announcement)
    }

    async fn get_announcement_by_id(&self, id: i64) -> Result<Option<Announcement>> {
        Ok(self.lock()?.announcements.get(&id).cloned())
    }

    async fn list_announcements_for_staff(
        &self,
        policy: ScopingPolicy,
        teacher_id: Option<i64>,
    ) -> Result<Vec<AnnouncementListItem>> {
        let state = self.lock()?;
        let rows = Self::sorted_announcements(&state);
        Ok(rows
            .into_iter()
            .filter(|a| match (policy, teacher_id) {
                (ScopingPolicy::EnrollmentFiltered, Some(teacher_id)) => {
                    a.teacher_id == teacher_id
                }
                _ => true,
            })
            .map(|a| {
                let view_count = state
                    .views
                    .iter()
                    .filter(|(announcement_id, _)| *announcement_id == a.id)
                    .count() as i64;
                AnnouncementListItem {
                    id: a.id,
                    title: a.title,
                    file_url: a.file_url,
                    created_at: a.created_at,
                    teacher_name: Self::teacher_name(&state, a.teacher_id),
                    class_name: Self::class_name(&state, a.class_id),
                    view_count,
                }
            })
            .collect())
    }

    async fn list_announcements_for_student(
        &self,
        policy: ScopingPolicy,
        student_id: i64,
    ) -> Result<Vec<StudentAnnouncementListItem>> {
        let state = self.lock()?;
        let rows = Self::sorted_announcements(&state);
        Ok(rows
            .into_iter()
            .filter(|a| match policy {
                ScopingPolicy::Broadcast => true,
                ScopingPolicy::EnrollmentFiltered => {
                    state.enrollments.contains(&(student_id, a.class_id))
                }
            })
            .map(|a| StudentAnnouncementListItem {
                id: a.id,
                title: a.title.clone(),
                file_url: a.file_url.clone(),
                created_at: a.created_at,
                teacher_name: Self::teacher_name(&state, a.teacher_id),
                class_name: Self::class_name(&state, a.class_id),
                is_viewed: state.views.contains(&(a.id, student_id)),
            })
            .collect())
    }

    async fn delete_announcement(&self, id: i64) -> Result<bool> {
        let mut state = self.lock()?;
        let removed = state.announcements.remove(&id).is_some();
        if removed {
            // 级联清理回执，与外键 ON DELETE CASCADE 对齐
            state
                .views
                .retain(|(announcement_id, _)| *announcement_id != id);
        }
        Ok(removed)
    }

    async fn mark_announcement_viewed(
        &self,
        announcement_id: i64,
        student_id: i64,
    ) -> Result<bool> {
        let mut state = self.lock()?;
        // insert 返回 false 即回执已存在——幂等，无错误
        Ok(state.views.insert((announcement_id, student_id)))
    }

    async fn count_announcement_views(&self, announcement_id: i64) -> Result<i64> {
        let state = self.lock()?;
        Ok(state
            .views
            .iter()
            .filter(|(id, _)| *id == announcement_id)
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::users::entities::UserRole;

    fn user_request(full_name: &str, email: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: "hashed".to_string(),
            role,
            address: None,
        }
    }

    async fn seed_announcement(storage: &MemoryStorage) -> (i64, i64, i64) {
        let teacher = storage
            .create_user(user_request("Teacher One", "t1@school.edu", UserRole::Teacher))
            .await
            .unwrap();
        let class = storage.insert_class("Grade 3-A", teacher.id).unwrap();
        let announcement = storage
            .create_announcement(NewAnnouncement {
                title: "Field trip".to_string(),
                class_id: class.id,
                teacher_id: teacher.id,
                file_url: "memory://attachments/announcements/1/1-a.pdf".to_string(),
            })
            .await
            .unwrap();
        (teacher.id, class.id, announcement.id)
    }

    #[tokio::test]
    async fn test_mark_viewed_is_idempotent() {
        let storage = MemoryStorage::new();
        let (_, _, announcement_id) = seed_announcement(&storage).await;

        assert!(storage.mark_announcement_viewed(announcement_id, 42).await.unwrap());
        assert!(!storage.mark_announcement_viewed(announcement_id, 42).await.unwrap());
        assert_eq!(
            storage.count_announcement_views(announcement_id).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_marks_record_single_receipt() {
        let storage = Arc::new(MemoryStorage::new());
        let (_, _, announcement_id) = seed_announcement(&storage).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage.mark_announcement_viewed(announcement_id, 7).await.unwrap()
            }));
        }

        let mut newly_recorded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                newly_recorded += 1;
            }
        }

        assert_eq!(newly_recorded, 1);
        assert_eq!(
            storage.count_announcement_views(announcement_id).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_student_list_carries_is_viewed() {
        let storage = MemoryStorage::new();
        let (_, _, announcement_id) = seed_announcement(&storage).await;
        let student = storage
            .create_user(user_request("Student One", "s1@school.edu", UserRole::Student))
            .await
            .unwrap();

        let before = storage
            .list_announcements_for_student(ScopingPolicy::Broadcast, student.id)
            .await
            .unwrap();
        assert_eq!(before.len(), 1);
        assert!(!before[0].is_viewed);

        storage
            .mark_announcement_viewed(announcement_id, student.id)
            .await
            .unwrap();

        let after = storage
            .list_announcements_for_student(ScopingPolicy::Broadcast, student.id)
            .await
            .unwrap();
        assert!(after[0].is_viewed);
    }

    #[tokio::test]
    async fn test_list_order_newest_first() {
        let storage = MemoryStorage::new();
        let (teacher_id, class_id, first_id) = seed_announcement(&storage).await;
        let second = storage
            .create_announcement(NewAnnouncement {
                title: "Second".to_string(),
                class_id,
                teacher_id,
                file_url: "memory://attachments/announcements/1/2-b.pdf".to_string(),
            })
            .await
            .unwrap();

        let rows = storage
            .list_announcements_for_staff(ScopingPolicy::Broadcast, None)
            .await
            .unwrap();
        // 同刻创建时按 id 倒序，稳定地把新行排在前面
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[1].id, first_id);
    }

    #[tokio::test]
    async fn test_broadcast_ignores_enrollment() {
        let storage = MemoryStorage::new();
        seed_announcement(&storage).await;
        let student = storage
            .create_user(user_request("Student One", "s1@school.edu", UserRole::Student))
            .await
            .unwrap();

        // 未选任何班级也能看到公告
        let rows = storage
            .list_announcements_for_student(ScopingPolicy::Broadcast, student.id)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        // 旧策略下同一学生看不到
        let filtered = storage
            .list_announcements_for_student(ScopingPolicy::EnrollmentFiltered, student.id)
            .await
            .unwrap();
        assert!(filtered.is_empty());
    }

    #[tokio::test]
    async fn test_enrollment_filtered_staff_scope() {
        let storage = MemoryStorage::new();
        let (teacher_id, _, _) = seed_announcement(&storage).await;
        let other = storage
            .create_user(user_request("Teacher Two", "t2@school.edu", UserRole::Teacher))
            .await
            .unwrap();

        let own = storage
            .list_announcements_for_staff(ScopingPolicy::EnrollmentFiltered, Some(teacher_id))
            .await
            .unwrap();
        assert_eq!(own.len(), 1);

        let others = storage
            .list_announcements_for_staff(ScopingPolicy::EnrollmentFiltered, Some(other.id))
            .await
            .unwrap();
        assert!(others.is_empty());

        // broadcast 下教师同样看到全站
        let all = storage
            .list_announcements_for_staff(ScopingPolicy::Broadcast, Some(other.id))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_staff_list_counts_views() {
        let storage = MemoryStorage::new();
        let (_, _, announcement_id) = seed_announcement(&storage).await;
        storage.mark_announcement_viewed(announcement_id, 100).await.unwrap();
        storage.mark_announcement_viewed(announcement_id, 101).await.unwrap();

        let rows = storage
            .list_announcements_for_staff(ScopingPolicy::Broadcast, None)
            .await
            .unwrap();
        assert_eq!(rows[0].view_count, 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_receipts() {
        let storage = MemoryStorage::new();
        let (_, _, announcement_id) = seed_announcement(&storage).await;
        storage.mark_announcement_viewed(announcement_id, 100).await.unwrap();

        assert!(storage.delete_announcement(announcement_id).await.unwrap());
        assert!(storage.get_announcement_by_id(announcement_id).await.unwrap().is_none());
        assert_eq!(
            storage.count_announcement_views(announcement_id).await.unwrap(),
            0
        );
        // 再次删除报告未找到
        assert!(!storage.delete_announcement(announcement_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let storage = MemoryStorage::new();
        storage
            .create_user(user_request("User A", "same@school.edu", UserRole::Student))
            .await
            .unwrap();
        assert!(
            storage
                .create_user(user_request("User B", "same@school.edu", UserRole::Student))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_class_listings_by_role() {
        let storage = MemoryStorage::new();
        let teacher = storage
            .create_user(user_request("Teacher One", "t1@school.edu", UserRole::Teacher))
            .await
            .unwrap();
        let student = storage
            .create_user(user_request("Student One", "s1@school.edu", UserRole::Student))
            .await
            .unwrap();
        let class_a = storage.insert_class("Grade 3-A", teacher.id).unwrap();
        let class_b = storage.insert_class("Grade 3-B", teacher.id + 1000).unwrap();
        storage.enroll(student.id, class_b.id).unwrap();

        let by_teacher = storage.list_classes_by_teacher(teacher.id).await.unwrap();
        assert_eq!(by_teacher.len(), 1);
        assert_eq!(by_teacher[0].id, class_a.id);

        let by_student = storage.list_classes_by_student(student.id).await.unwrap();
        assert_eq!(by_student.len(), 1);
        assert_eq!(by_student[0].id, class_b.id);

        assert_eq!(storage.list_all_classes().await.unwrap().len(), 2);
    }
}
