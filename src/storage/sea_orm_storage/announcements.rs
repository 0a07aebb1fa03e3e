//! 公告存储操作

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::announcement_views::{Column as ViewColumn, Entity as AnnouncementViews};
use crate::entity::announcements::{ActiveModel, Column, Entity as Announcements, Model};
use crate::entity::classes::{Column as ClassColumn, Entity as Classes};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{PortalError, Result};
use crate::models::announcements::{
    entities::{Announcement, ScopingPolicy},
    requests::NewAnnouncement,
    responses::{AnnouncementListItem, StudentAnnouncementListItem},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 入库公告（服务层已完成校验与附件上传）
    pub async fn create_announcement_impl(&self, req: NewAnnouncement) -> Result<Announcement> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            teacher_id: Set(req.teacher_id),
            class_id: Set(req.class_id),
            title: Set(req.title),
            file_url: Set(req.file_url),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("创建公告失败: {e}")))?;

        Ok(result.into_announcement())
    }

    /// 通过 ID 获取公告
    pub async fn get_announcement_by_id_impl(&self, id: i64) -> Result<Option<Announcement>> {
        let result = Announcements::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询公告失败: {e}")))?;

        Ok(result.map(|m| m.into_announcement()))
    }

    /// 教职员视图列表（管理员 teacher_id 为 None）
    pub async fn list_announcements_for_staff_impl(
        &self,
        policy: ScopingPolicy,
        teacher_id: Option<i64>,
    ) -> Result<Vec<AnnouncementListItem>> {
        let mut select = Announcements::find();

        // broadcast 策略下教师与管理员同样看到全站公告；
        // enrollment_filtered 恢复旧行为，教师仅见自己发布的
        if policy == ScopingPolicy::EnrollmentFiltered
            && let Some(teacher_id) = teacher_id
        {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        let rows = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询公告列表失败: {e}")))?;

        let (teacher_names, class_names) = self.load_join_names(&rows).await?;
        let view_counts = self.load_view_counts(&rows).await?;

        Ok(rows
            .into_iter()
            .map(|m| {
                let view_count = view_counts.get(&m.id).copied().unwrap_or(0);
                AnnouncementListItem {
                    id: m.id,
                    title: m.title,
                    file_url: m.file_url,
                    created_at: chrono::DateTime::from_timestamp(m.created_at, 0)
                        .unwrap_or_default(),
                    teacher_name: teacher_names.get(&m.teacher_id).cloned().unwrap_or_default(),
                    class_name: class_names.get(&m.class_id).cloned().unwrap_or_default(),
                    view_count,
                }
            })
            .collect())
    }

    /// 学生视图列表：附该学生的查看状态
    pub async fn list_announcements_for_student_impl(
        &self,
        policy: ScopingPolicy,
        student_id: i64,
    ) -> Result<Vec<StudentAnnouncementListItem>> {
        let mut select = Announcements::find();

        // enrollment_filtered 恢复旧行为，仅列出所选班级的公告
        if policy == ScopingPolicy::EnrollmentFiltered {
            let class_ids = self.enrolled_class_ids(student_id).await?;
            select = select.filter(Column::ClassId.is_in(class_ids));
        }

        let rows = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询公告列表失败: {e}")))?;

        let (teacher_names, class_names) = self.load_join_names(&rows).await?;

        // 该学生的回执集合，用于 is_viewed 存在性判断
        let announcement_ids: Vec<i64> = rows.iter().map(|m| m.id).collect();
        let viewed: HashSet<i64> = if announcement_ids.is_empty() {
            HashSet::new()
        } else {
            AnnouncementViews::find()
                .filter(ViewColumn::AnnouncementId.is_in(announcement_ids))
                .filter(ViewColumn::StudentId.eq(student_id))
                .all(&self.db)
                .await
                .map_err(|e| PortalError::database_operation(format!("查询回执失败: {e}")))?
                .into_iter()
                .map(|v| v.announcement_id)
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|m| StudentAnnouncementListItem {
                id: m.id,
                title: m.title,
                file_url: m.file_url,
                created_at: chrono::DateTime::from_timestamp(m.created_at, 0).unwrap_or_default(),
                teacher_name: teacher_names.get(&m.teacher_id).cloned().unwrap_or_default(),
                class_name: class_names.get(&m.class_id).cloned().unwrap_or_default(),
                is_viewed: viewed.contains(&m.id),
            })
            .collect())
    }

    /// 删除公告行
    pub async fn delete_announcement_impl(&self, id: i64) -> Result<bool> {
        let result = Announcements::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("删除公告失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生所选班级的 ID 集合
    async fn enrolled_class_ids(&self, student_id: i64) -> Result<Vec<i64>> {
        let enrollments = Enrollments::find()
            .filter(EnrollmentColumn::StudentId.eq(student_id))
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(enrollments.into_iter().map(|e| e.class_id).collect())
    }

    /// 批量取教师姓名与班级名称
    async fn load_join_names(
        &self,
        rows: &[Model],
    ) -> Result<(HashMap<i64, String>, HashMap<i64, String>)> {
        let teacher_ids: Vec<i64> = rows
            .iter()
            .map(|m| m.teacher_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let class_ids: Vec<i64> = rows
            .iter()
            .map(|m| m.class_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut teacher_names = HashMap::new();
        if !teacher_ids.is_empty() {
            let users = Users::find()
                .filter(UserColumn::Id.is_in(teacher_ids))
                .all(&self.db)
                .await
                .map_err(|e| PortalError::database_operation(format!("查询发布者失败: {e}")))?;
            for user in users {
                teacher_names.insert(user.id, user.full_name);
            }
        }

        let mut class_names = HashMap::new();
        if !class_ids.is_empty() {
            let classes = Classes::find()
                .filter(ClassColumn::Id.is_in(class_ids))
                .all(&self.db)
                .await
                .map_err(|e| PortalError::database_operation(format!("查询班级失败: {e}")))?;
            for class in classes {
                class_names.insert(class.id, class.class_name);
            }
        }

        Ok((teacher_names, class_names))
    }

    /// 批量统计查看人数
    async fn load_view_counts(&self, rows: &[Model]) -> Result<HashMap<i64, i64>> {
        let announcement_ids: Vec<i64> = rows.iter().map(|m| m.id).collect();
        if announcement_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let views = AnnouncementViews::find()
            .filter(ViewColumn::AnnouncementId.is_in(announcement_ids))
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询回执失败: {e}")))?;

        let mut counts: HashMap<i64, i64> = HashMap::new();
        for view in views {
            *counts.entry(view.announcement_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
