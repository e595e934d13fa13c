// ==========================================
// 世界杯票务系统 - 人流监控
// ==========================================
// 职责: 入场/出场计数、入场告警检查、分析落库、全场巡检
// 说明: 分析只读库存，不修改比赛/区域计数
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::flow::{FlowAnalysis, FlowRecord};
use crate::domain::outcome::{Outcome, RejectReason};
use crate::domain::zone::Zone;
use crate::engine::alert_trigger::AlertTrigger;
use crate::engine::flow_analyzer::FlowAnalyzer;
use crate::perf::PerfGuard;
use crate::repository::analysis_repo::FlowAnalysisRepository;
use crate::repository::error::RepositoryResult;
use crate::repository::flow_repo::FlowRepository;
use crate::repository::match_repo::MatchRepository;
use crate::repository::zone_repo::ZoneRepository;
use chrono::NaiveDateTime;
use std::sync::Arc;
use uuid::Uuid;

/// 方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Passage {
    Entry,
    Exit,
}

/// 为区域创建空白人流记录（闸口默认 "Gate <区域名首字母>"）
pub fn initial_flow_record(zone: &Zone, now: NaiveDateTime) -> FlowRecord {
    let gate = zone.gate.clone().or_else(|| {
        zone.name
            .chars()
            .next()
            .map(|c| format!("Gate {}", c.to_uppercase()))
    });
    FlowRecord {
        flow_id: Uuid::new_v4().to_string(),
        match_id: zone.match_id.clone(),
        zone_id: zone.zone_id.clone(),
        zone_name: zone.name.clone(),
        recorded_at: now,
        entries: 0,
        exits: 0,
        occupancy: 0,
        capacity: zone.capacity,
        density: 0.0,
        gate,
    }
}

/// 全场巡检结果
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub occupancy_alerts: Vec<Alert>,
    pub flow_alerts: Vec<Alert>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.occupancy_alerts.len() + self.flow_alerts.len()
    }
}

pub struct FlowMonitor {
    match_repo: Arc<MatchRepository>,
    zone_repo: Arc<ZoneRepository>,
    flow_repo: Arc<FlowRepository>,
    analysis_repo: Arc<FlowAnalysisRepository>,
    alert_trigger: Arc<AlertTrigger>,
    analyzer: FlowAnalyzer,
}

impl FlowMonitor {
    pub fn new(
        match_repo: Arc<MatchRepository>,
        zone_repo: Arc<ZoneRepository>,
        flow_repo: Arc<FlowRepository>,
        analysis_repo: Arc<FlowAnalysisRepository>,
        alert_trigger: Arc<AlertTrigger>,
        analyzer: FlowAnalyzer,
    ) -> Self {
        Self {
            match_repo,
            zone_repo,
            flow_repo,
            analysis_repo,
            alert_trigger,
            analyzer,
        }
    }

    pub fn analyzer(&self) -> &FlowAnalyzer {
        &self.analyzer
    }

    /// 入场: 计数后立即做入场告警检查
    pub fn record_entry(
        &self,
        match_id: &str,
        zone_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<FlowRecord>> {
        let outcome = self.record_passage(match_id, zone_id, Passage::Entry, now)?;
        if let Outcome::Accepted(record) = &outcome {
            self.alert_trigger.check_entry(record, now)?;
        }
        Ok(outcome)
    }

    pub fn record_exit(
        &self,
        match_id: &str,
        zone_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<FlowRecord>> {
        self.record_passage(match_id, zone_id, Passage::Exit, now)
    }

    fn record_passage(
        &self,
        match_id: &str,
        zone_id: &str,
        passage: Passage,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<FlowRecord>> {
        let apply = |repo: &FlowRepository| match passage {
            Passage::Entry => repo.apply_entry(match_id, zone_id, now),
            Passage::Exit => repo.apply_exit(match_id, zone_id, now),
        };

        if let Some(record) = apply(&self.flow_repo)? {
            tracing::debug!(match_id, zone_id, ?passage, occupancy = record.occupancy, "人流计数");
            return Ok(Outcome::Accepted(record));
        }

        // 区域尚无人流记录: 校验后补建再计数
        let zone = match self.zone_repo.find_by_id(zone_id)? {
            Some(z) => z,
            None => {
                return Ok(Outcome::Rejected(RejectReason::ZoneNotFound {
                    zone_id: zone_id.to_string(),
                }))
            }
        };
        if zone.match_id != match_id {
            return Ok(Outcome::Rejected(RejectReason::ZoneNotInMatch {
                zone_id: zone_id.to_string(),
                match_id: match_id.to_string(),
            }));
        }

        self.flow_repo.insert(&initial_flow_record(&zone, now))?;
        tracing::info!(match_id, zone_id, "补建区域人流记录");

        match apply(&self.flow_repo)? {
            Some(record) => Ok(Outcome::Accepted(record)),
            None => Ok(Outcome::Rejected(RejectReason::ZoneNotFound {
                zone_id: zone_id.to_string(),
            })),
        }
    }

    /// 分析比赛人流并追加历史记录
    pub fn analyze(
        &self,
        match_id: &str,
        gate_count: Option<i64>,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<FlowAnalysis>> {
        let _perf = PerfGuard::new("analyze_flow");
        if self.match_repo.find_by_id(match_id)?.is_none() {
            return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                match_id: match_id.to_string(),
            }));
        }

        let records = self.flow_repo.list_by_match(match_id)?;
        let total_occupancy = self.flow_repo.total_occupancy(match_id)?;
        let analysis = self
            .analyzer
            .analyze(match_id, &records, total_occupancy, gate_count, now);
        self.analysis_repo.insert(&analysis)?;

        tracing::info!(
            match_id,
            status = %analysis.status,
            density_mean = analysis.density_mean,
            density_max = analysis.density_max,
            efficiency_score = analysis.efficiency_score,
            "人流分析完成"
        );
        Ok(Outcome::Accepted(analysis))
    }

    /// 全场巡检: 座位上座率 + 人流密度
    pub fn sweep(&self, match_id: &str, now: NaiveDateTime) -> RepositoryResult<SweepReport> {
        let zones = self.zone_repo.list_by_match(match_id)?;
        let records = self.flow_repo.list_by_match(match_id)?;
        Ok(SweepReport {
            occupancy_alerts: self.alert_trigger.sweep_zones(&zones, now)?,
            flow_alerts: self.alert_trigger.sweep_flows(&records, now)?,
        })
    }
}
