use serde::Serialize;

// 公告创建成功响应（回显字段 + 解析出的文件 URL）
#[derive(Debug, Serialize)]
pub struct AnnouncementCreatedResponse {
    pub id: i64,
    pub teacher_id: i64,
    pub class_id: i64,
    pub title: String,
    pub file_url: String,
}

// 管理员/教师视图的公告列表行：附教师姓名、班级名与查看计数
#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementListItem {
    pub id: i64,
    pub title: String,
    pub file_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub teacher_name: String,
    pub class_name: String,
    pub view_count: i64,
}

// 学生视图的公告列表行：附当前学生自己的查看状态
#[derive(Debug, Clone, Serialize)]
pub struct StudentAnnouncementListItem {
    pub id: i64,
    pub title: String,
    pub file_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub teacher_name: String,
    pub class_name: String,
    pub is_viewed: bool,
}
