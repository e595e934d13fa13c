// ==========================================
// 世界杯票务系统 - 告警触发引擎
// ==========================================
// 两条独立触发路径:
// 1. 单次入场检查: 人流密度 > 95 CRITICAL, > 90 HIGH
// 2. 全场巡检:     座位上座率 > 95 CRITICAL, > 85 HIGH, > 75 MEDIUM
//    人流巡检:     人流密度 > 95 CRITICAL
// 每次越限都写入新告警（不去重）
// ==========================================

use crate::config::policy::AlertPolicy;
use crate::domain::alert::Alert;
use crate::domain::flow::FlowRecord;
use crate::domain::types::{AlertLevel, AlertType};
use crate::domain::zone::{SeatInventory, Zone};
use crate::repository::alert_repo::AlertRepository;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use std::sync::Arc;

pub const SOURCE_ENTRY_CHECK: &str = "entry_check";
pub const SOURCE_OCCUPANCY_SWEEP: &str = "occupancy_sweep";
pub const SOURCE_FLOW_SWEEP: &str = "flow_sweep";

pub struct AlertTrigger {
    alert_repo: Arc<AlertRepository>,
    policy: AlertPolicy,
}

impl AlertTrigger {
    pub fn new(alert_repo: Arc<AlertRepository>, policy: AlertPolicy) -> Self {
        Self { alert_repo, policy }
    }

    // ==========================================
    // 阈值判定（纯函数）
    // ==========================================

    pub fn classify_entry_density(&self, density: f64) -> Option<AlertLevel> {
        if density > self.policy.entry_critical {
            Some(AlertLevel::Critical)
        } else if density > self.policy.entry_high {
            Some(AlertLevel::High)
        } else {
            None
        }
    }

    pub fn classify_sweep_occupancy(&self, rate: f64) -> Option<AlertLevel> {
        if rate > self.policy.sweep_critical {
            Some(AlertLevel::Critical)
        } else if rate > self.policy.sweep_high {
            Some(AlertLevel::High)
        } else if rate > self.policy.sweep_medium {
            Some(AlertLevel::Medium)
        } else {
            None
        }
    }

    // ==========================================
    // 触发路径
    // ==========================================

    /// 入场后检查该区域最新人流记录
    pub fn check_entry(
        &self,
        record: &FlowRecord,
        now: NaiveDateTime,
    ) -> RepositoryResult<Option<Alert>> {
        let level = match self.classify_entry_density(record.density) {
            Some(level) => level,
            None => return Ok(None),
        };

        let alert = Alert::new(
            format!("区域超员: {}", record.zone_name),
            format!(
                "区域 {} 人流密度 {:.1}% (在场 {}/{})",
                record.zone_name, record.density, record.occupancy, record.capacity
            ),
            AlertType::Overcrowding,
            level,
            now,
        )
        .for_zone(&record.match_id, &record.zone_id)
        .with_source(SOURCE_ENTRY_CHECK);

        self.alert_repo.insert(&alert)?;
        tracing::warn!(
            match_id = %record.match_id,
            zone_id = %record.zone_id,
            density = record.density,
            level = %level,
            "入场检查触发告警"
        );
        Ok(Some(alert))
    }

    /// 全场巡检：按座位上座率逐区域判定
    pub fn sweep_zones(&self, zones: &[Zone], now: NaiveDateTime) -> RepositoryResult<Vec<Alert>> {
        let mut raised = Vec::new();
        for zone in zones {
            let rate = zone.occupancy_rate();
            let level = match self.classify_sweep_occupancy(rate) {
                Some(level) => level,
                None => continue,
            };

            let alert = Alert::new(
                format!("上座率告警: {}", zone.name),
                format!(
                    "区域 {} 上座率 {:.1}% (余座 {}/{})",
                    zone.name, rate, zone.available, zone.capacity
                ),
                AlertType::Overcrowding,
                level,
                now,
            )
            .for_zone(&zone.match_id, &zone.zone_id)
            .with_source(SOURCE_OCCUPANCY_SWEEP);

            self.alert_repo.insert(&alert)?;
            raised.push(alert);
        }

        if !raised.is_empty() {
            tracing::warn!(count = raised.len(), "全场巡检触发告警");
        }
        Ok(raised)
    }

    /// 人流巡检：密度超过临界值的记录
    pub fn sweep_flows(
        &self,
        records: &[FlowRecord],
        now: NaiveDateTime,
    ) -> RepositoryResult<Vec<Alert>> {
        let mut raised = Vec::new();
        for record in records
            .iter()
            .filter(|r| r.density > self.policy.flow_sweep_critical)
        {
            let alert = Alert::new(
                format!("人流临界: {}", record.zone_name),
                format!("区域 {} 人流密度 {:.1}%", record.zone_name, record.density),
                AlertType::Overcrowding,
                AlertLevel::Critical,
                now,
            )
            .for_zone(&record.match_id, &record.zone_id)
            .with_source(SOURCE_FLOW_SWEEP);

            self.alert_repo.insert(&alert)?;
            raised.push(alert);
        }
        Ok(raised)
    }
}
