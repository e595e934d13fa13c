// ==========================================
// 世界杯票务系统 - 用户领域模型
// ==========================================
// 角色为带负载的枚举: Spectator / Administrator
// 对齐: v0.1_init.sql app_user 表（角色字段按需为空）
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectatorProfile {
    pub nationality: Option<String>,
    pub passport_no: Option<String>,
    pub tickets_purchased: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub access_level: i32,
    pub department: Option<String>,
    pub can_manage_users: bool,
    pub can_manage_matches: bool,
    pub can_view_alerts: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Spectator(SpectatorProfile),
    Administrator(AdminProfile),
}

impl UserRole {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            UserRole::Spectator(_) => "SPECTATOR",
            UserRole::Administrator(_) => "ADMINISTRATOR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String, // 自然键
    pub last_name: String,
    pub first_name: String,
    pub active: bool,
    pub role: UserRole,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn as_spectator(&self) -> Option<&SpectatorProfile> {
        match &self.role {
            UserRole::Spectator(p) => Some(p),
            UserRole::Administrator(_) => None,
        }
    }

    pub fn as_admin(&self) -> Option<&AdminProfile> {
        match &self.role {
            UserRole::Administrator(p) => Some(p),
            UserRole::Spectator(_) => None,
        }
    }

    /// 可处理告警的管理员
    pub fn can_resolve_alerts(&self) -> bool {
        self.active && self.as_admin().map(|a| a.can_view_alerts).unwrap_or(false)
    }
}
