use serde::{Deserialize, Serialize};

// 公告实体
//
// file_url 创建后即非空（创建前置校验保证），公告不支持原地更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub file_url: String,
    pub teacher_id: i64,
    pub class_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 公告可见范围策略
///
/// `Broadcast`：列表与标记操作全站可见，不校验选课关系——
/// 这是当前线上行为（选课过滤被明确移除）。
/// `EnrollmentFiltered`：被替换掉的旧策略，教师仅见自己发布的公告，
/// 学生仅见（且仅能标记）所选班级的公告。保留为具名策略便于测试与回退。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopingPolicy {
    Broadcast,
    EnrollmentFiltered,
}

impl Default for ScopingPolicy {
    fn default() -> Self {
        ScopingPolicy::Broadcast
    }
}

impl std::str::FromStr for ScopingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broadcast" => Ok(ScopingPolicy::Broadcast),
            "enrollment_filtered" => Ok(ScopingPolicy::EnrollmentFiltered),
            _ => Err(format!(
                "Invalid scoping policy: {s} (expected broadcast or enrollment_filtered)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoping_policy_parse() {
        assert_eq!(
            "broadcast".parse::<ScopingPolicy>().unwrap(),
            ScopingPolicy::Broadcast
        );
        assert_eq!(
            "enrollment_filtered".parse::<ScopingPolicy>().unwrap(),
            ScopingPolicy::EnrollmentFiltered
        );
        assert!("enrolled".parse::<ScopingPolicy>().is_err());
    }

    #[test]
    fn test_scoping_policy_default_is_broadcast() {
        assert_eq!(ScopingPolicy::default(), ScopingPolicy::Broadcast);
    }
}
