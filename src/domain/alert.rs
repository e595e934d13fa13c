// ==========================================
// 世界杯票务系统 - 告警领域模型
// ==========================================
// 对齐: v0.1_init.sql alert 表
// ==========================================

use crate::domain::types::{AlertLevel, AlertType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub title: String,
    pub message: String,
    pub alert_type: AlertType,
    pub level: AlertLevel,

    pub match_id: Option<String>,
    pub zone_id: Option<String>,
    pub source: Option<String>, // 触发来源，如 entry_check / sweep

    pub created_at: NaiveDateTime,

    // ===== 处理信息 =====
    pub resolved: bool,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<String>,
    pub resolution_comment: Option<String>,
}

impl Alert {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        alert_type: AlertType,
        level: AlertLevel,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            title: title.into(),
            message: message.into(),
            alert_type,
            level,
            match_id: None,
            zone_id: None,
            source: None,
            created_at: now,
            resolved: false,
            resolved_at: None,
            resolved_by: None,
            resolution_comment: None,
        }
    }

    pub fn for_zone(mut self, match_id: &str, zone_id: &str) -> Self {
        self.match_id = Some(match_id.to_string());
        self.zone_id = Some(zone_id.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn is_active(&self) -> bool {
        !self.resolved
    }

    /// 未处理且级别 HIGH 及以上
    pub fn is_critical(&self) -> bool {
        self.is_active() && self.level.is_critical()
    }

    pub fn resolve(&mut self, admin_id: &str, comment: Option<&str>, now: NaiveDateTime) {
        self.resolved = true;
        self.resolved_at = Some(now);
        self.resolved_by = Some(admin_id.to_string());
        self.resolution_comment = comment.map(str::to_string);
    }
}
