use super::entities::UserRole;
use serde::Deserialize;

// 用户注册请求
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    #[serde(default)]
    pub address: Option<String>,
}

// 用户资料更新请求
//
// 只允许修改邮箱、密码和地址，角色与姓名创建后固定。
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
}
