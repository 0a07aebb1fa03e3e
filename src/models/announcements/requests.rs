/// 公告入库请求（服务层在校验与附件上传完成后构造）
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub class_id: i64,
    pub teacher_id: i64,
    pub file_url: String,
}
