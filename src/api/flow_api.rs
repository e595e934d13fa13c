// ==========================================
// 世界杯票务系统 - 人流 API
// ==========================================
// 职责: 入场/出场计数、人流分析（同步/异步）、分析历史、巡检
// ==========================================

use std::sync::Arc;

use crate::api::clock_now;
use crate::api::error::{require_non_empty, ApiError, ApiResult};
use crate::domain::flow::{FlowAnalysis, FlowRecord};
use crate::domain::outcome::Outcome;
use crate::engine::flow_monitor::{FlowMonitor, SweepReport};
use crate::repository::analysis_repo::FlowAnalysisRepository;
use crate::repository::flow_repo::FlowRepository;

pub struct FlowApi {
    monitor: Arc<FlowMonitor>,
    flow_repo: Arc<FlowRepository>,
    analysis_repo: Arc<FlowAnalysisRepository>,
}

impl FlowApi {
    pub fn new(
        monitor: Arc<FlowMonitor>,
        flow_repo: Arc<FlowRepository>,
        analysis_repo: Arc<FlowAnalysisRepository>,
    ) -> Self {
        Self {
            monitor,
            flow_repo,
            analysis_repo,
        }
    }

    // ==========================================
    // 计数
    // ==========================================

    pub fn record_entry(&self, match_id: &str, zone_id: &str) -> ApiResult<Outcome<FlowRecord>> {
        require_non_empty(match_id, "比赛ID")?;
        require_non_empty(zone_id, "区域ID")?;
        Ok(self.monitor.record_entry(match_id, zone_id, clock_now())?)
    }

    pub fn record_exit(&self, match_id: &str, zone_id: &str) -> ApiResult<Outcome<FlowRecord>> {
        require_non_empty(match_id, "比赛ID")?;
        require_non_empty(zone_id, "区域ID")?;
        Ok(self.monitor.record_exit(match_id, zone_id, clock_now())?)
    }

    // ==========================================
    // 分析
    // ==========================================

    /// 同步分析
    ///
    /// gate_count 为 None 时使用配置的默认闸口数
    pub fn analyze_flow(
        &self,
        match_id: &str,
        gate_count: Option<i64>,
    ) -> ApiResult<Outcome<FlowAnalysis>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.monitor.analyze(match_id, gate_count, clock_now())?)
    }

    /// 异步分析: 放到阻塞线程池执行，调用方不被 SQLite 访问阻塞
    pub async fn analyze_flow_async(
        &self,
        match_id: &str,
        gate_count: Option<i64>,
    ) -> ApiResult<Outcome<FlowAnalysis>> {
        require_non_empty(match_id, "比赛ID")?;

        let monitor = Arc::clone(&self.monitor);
        let match_id = match_id.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            monitor.analyze(&match_id, gate_count, clock_now())
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("人流分析任务失败: {}", e)))??;

        Ok(outcome)
    }

    pub fn latest_analysis(&self, match_id: &str) -> ApiResult<Option<FlowAnalysis>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.analysis_repo.find_latest(match_id)?)
    }

    /// 分析历史（最新在前）
    pub fn analysis_history(&self, match_id: &str) -> ApiResult<Vec<FlowAnalysis>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.analysis_repo.list_by_match(match_id)?)
    }

    /// 效率评分低于配置阈值的分析
    pub fn low_score_analyses(&self) -> ApiResult<Vec<FlowAnalysis>> {
        let threshold = self.monitor.analyzer().policy().low_score_threshold;
        Ok(self.analysis_repo.list_low_score(threshold)?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn flow_records(&self, match_id: &str) -> ApiResult<Vec<FlowRecord>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.flow_repo.list_by_match(match_id)?)
    }

    pub fn total_occupancy(&self, match_id: &str) -> ApiResult<i64> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.flow_repo.total_occupancy(match_id)?)
    }

    pub fn mean_density(&self, match_id: &str) -> ApiResult<f64> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.flow_repo.mean_density(match_id)?)
    }

    pub fn records_above_density(
        &self,
        match_id: &str,
        threshold: f64,
    ) -> ApiResult<Vec<FlowRecord>> {
        require_non_empty(match_id, "比赛ID")?;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ApiError::InvalidInput(format!(
                "密度阈值必须在 0-100 之间: {}",
                threshold
            )));
        }
        Ok(self.flow_repo.list_above_density(match_id, threshold)?)
    }

    /// 全场巡检（上座率 + 人流密度）
    pub fn sweep(&self, match_id: &str) -> ApiResult<SweepReport> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.monitor.sweep(match_id, clock_now())?)
    }
}
