// ==========================================
// 世界杯票务系统 - 告警管理 API
// ==========================================
// 职责: 告警查询与处理（处理人必须是有告警权限的管理员）
// ==========================================

use std::sync::Arc;

use crate::api::clock_now;
use crate::api::error::{require_non_empty, ApiError, ApiResult};
use crate::domain::alert::Alert;
use crate::repository::alert_repo::AlertRepository;
use crate::repository::user_repo::UserRepository;

pub struct AlertApi {
    alert_repo: Arc<AlertRepository>,
    user_repo: Arc<UserRepository>,
}

impl AlertApi {
    pub fn new(alert_repo: Arc<AlertRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            alert_repo,
            user_repo,
        }
    }

    pub fn list_active(&self) -> ApiResult<Vec<Alert>> {
        Ok(self.alert_repo.list_active()?)
    }

    /// 未处理的 HIGH/CRITICAL 告警
    pub fn list_critical(&self) -> ApiResult<Vec<Alert>> {
        Ok(self.alert_repo.list_critical()?)
    }

    pub fn list_by_match(&self, match_id: &str) -> ApiResult<Vec<Alert>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.alert_repo.list_by_match(match_id)?)
    }

    pub fn list_by_zone(&self, zone_id: &str) -> ApiResult<Vec<Alert>> {
        require_non_empty(zone_id, "区域ID")?;
        Ok(self.alert_repo.list_by_zone(zone_id)?)
    }

    pub fn latest(&self, limit: u32) -> ApiResult<Vec<Alert>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于0".to_string()));
        }
        Ok(self.alert_repo.list_latest(limit)?)
    }

    pub fn count_active(&self) -> ApiResult<i64> {
        Ok(self.alert_repo.count_active()?)
    }

    /// 处理告警
    ///
    /// # 返回
    /// - Ok(Alert): 处理后的告警
    /// - Err(PermissionDenied): 处理人不是有告警权限的在职管理员
    /// - Err(NotFound): 告警不存在
    /// - Err(BusinessRuleViolation): 告警已处理
    pub fn resolve_alert(
        &self,
        alert_id: &str,
        admin_id: &str,
        comment: Option<&str>,
    ) -> ApiResult<Alert> {
        require_non_empty(alert_id, "告警ID")?;
        require_non_empty(admin_id, "管理员ID")?;

        let admin = self
            .user_repo
            .find_by_id(admin_id)?
            .ok_or_else(|| ApiError::NotFound(format!("用户(id={})不存在", admin_id)))?;
        if !admin.can_resolve_alerts() {
            tracing::warn!(admin_id, alert_id, "无告警处理权限");
            return Err(ApiError::PermissionDenied(format!(
                "用户 {} 无告警处理权限",
                admin.email
            )));
        }

        let alert = self
            .alert_repo
            .find_by_id(alert_id)?
            .ok_or_else(|| ApiError::NotFound(format!("告警(id={})不存在", alert_id)))?;
        if alert.resolved {
            return Err(ApiError::BusinessRuleViolation(format!(
                "告警 {} 已处理",
                alert_id
            )));
        }

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        if !self
            .alert_repo
            .resolve(alert_id, admin_id, comment, clock_now())?
        {
            return Err(ApiError::BusinessRuleViolation(format!(
                "告警 {} 已处理",
                alert_id
            )));
        }
        tracing::info!(alert_id, admin_id, "告警已处理");

        self.alert_repo
            .find_by_id(alert_id)?
            .ok_or_else(|| ApiError::NotFound(format!("告警(id={})不存在", alert_id)))
    }
}
