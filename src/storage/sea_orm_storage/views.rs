//! 公告查看回执存储操作

use super::SeaOrmStorage;
use crate::entity::announcement_views::{ActiveModel, Column, Entity as AnnouncementViews};
use crate::errors::{PortalError, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 幂等标记公告已查看
    ///
    /// 唯一性由 (announcement_id, student_id) 唯一索引保证，
    /// 冲突时 DO NOTHING——并发双写互不报错，最多一行落库。
    /// 返回 true 表示本次新写入，false 表示回执已存在。
    pub async fn mark_announcement_viewed_impl(
        &self,
        announcement_id: i64,
        student_id: i64,
    ) -> Result<bool> {
        let model = ActiveModel {
            announcement_id: Set(announcement_id),
            student_id: Set(student_id),
            ..Default::default()
        };

        let inserted = AnnouncementViews::insert(model)
            .on_conflict(
                OnConflict::columns([Column::AnnouncementId, Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("写入查看回执失败: {e}")))?;

        Ok(inserted > 0)
    }

    /// 公告的查看人数
    pub async fn count_announcement_views_impl(&self, announcement_id: i64) -> Result<i64> {
        let count = AnnouncementViews::find()
            .filter(Column::AnnouncementId.eq(announcement_id))
            .count(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("统计查看人数失败: {e}")))?;

        Ok(count as i64)
    }
}
