use serde::{Deserialize, Serialize};

// 班级实体
//
// 本系统内只读：没有创建/更新/删除班级的入口，
// 数据由外部流程维护。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub class_name: String,
    pub teacher_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
