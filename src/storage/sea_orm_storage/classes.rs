//! 班级存储操作（只读查询）

use super::SeaOrmStorage;
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::entity::classes::{Column, Entity as Classes};
use crate::errors::{PortalError, Result};
use crate::models::classes::entities::Class;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

impl SeaOrmStorage {
    /// 教师名下的班级
    pub async fn list_classes_by_teacher_impl(&self, teacher_id: i64) -> Result<Vec<Class>> {
        let result = Classes::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询教师班级失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_class()).collect())
    }

    /// 学生所选的班级（经 enrollments 关联）
    pub async fn list_classes_by_student_impl(&self, student_id: i64) -> Result<Vec<Class>> {
        let enrollments = Enrollments::find()
            .filter(EnrollmentColumn::StudentId.eq(student_id))
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询选课记录失败: {e}")))?;

        let class_ids: Vec<i64> = enrollments.into_iter().map(|e| e.class_id).collect();
        if class_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = Classes::find()
            .filter(Column::Id.is_in(class_ids))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询学生班级失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_class()).collect())
    }

    /// 全部班级
    pub async fn list_all_classes_impl(&self) -> Result<Vec<Class>> {
        let result = Classes::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询班级列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_class()).collect())
    }

    /// 通过 ID 获取班级
    pub async fn get_class_by_id_impl(&self, class_id: i64) -> Result<Option<Class>> {
        let result = Classes::find_by_id(class_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询班级失败: {e}")))?;

        Ok(result.map(|m| m.into_class()))
    }
}
