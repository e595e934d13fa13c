// ==========================================
// 世界杯票务系统 - 用户 API
// ==========================================
// 职责: 观众/管理员注册、查询、启停
// 说明: 不含认证（密码、会话不在本系统范围）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::clock_now;
use crate::api::error::{require_non_empty, ApiError, ApiResult};
use crate::domain::user::{AdminProfile, SpectatorProfile, User, UserRole};
use crate::repository::user_repo::UserRepository;

/// 注册请求（公共字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub last_name: String,
    pub first_name: String,
}

pub struct UserApi {
    user_repo: Arc<UserRepository>,
}

impl UserApi {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    pub fn register_spectator(
        &self,
        req: RegisterUserRequest,
        nationality: Option<String>,
        passport_no: Option<String>,
    ) -> ApiResult<User> {
        self.register(
            req,
            UserRole::Spectator(SpectatorProfile {
                nationality,
                passport_no,
                tickets_purchased: 0,
            }),
        )
    }

    pub fn register_administrator(
        &self,
        req: RegisterUserRequest,
        profile: AdminProfile,
    ) -> ApiResult<User> {
        self.register(req, UserRole::Administrator(profile))
    }

    fn register(&self, req: RegisterUserRequest, role: UserRole) -> ApiResult<User> {
        require_non_empty(&req.email, "邮箱")?;
        require_non_empty(&req.last_name, "姓")?;
        require_non_empty(&req.first_name, "名")?;

        let email = req.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ApiError::InvalidInput(format!("邮箱格式错误: {}", email)));
        }
        if self.user_repo.find_by_email(&email)?.is_some() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "邮箱已注册: {}",
                email
            )));
        }

        let user = User {
            user_id: Uuid::new_v4().to_string(),
            email,
            last_name: req.last_name.trim().to_string(),
            first_name: req.first_name.trim().to_string(),
            active: true,
            role,
            created_at: clock_now(),
        };
        self.user_repo.insert(&user)?;
        tracing::info!(user_id = %user.user_id, role = user.role.to_db_str(), "用户已注册");
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> ApiResult<Option<User>> {
        require_non_empty(user_id, "用户ID")?;
        Ok(self.user_repo.find_by_id(user_id)?)
    }

    pub fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        require_non_empty(email, "邮箱")?;
        Ok(self.user_repo.find_by_email(email)?)
    }

    pub fn list_spectators(&self) -> ApiResult<Vec<User>> {
        Ok(self.user_repo.list_spectators()?)
    }

    pub fn set_active(&self, user_id: &str, active: bool) -> ApiResult<bool> {
        require_non_empty(user_id, "用户ID")?;
        Ok(self.user_repo.set_active(user_id, active)?)
    }
}
