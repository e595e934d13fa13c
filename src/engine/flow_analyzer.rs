// ==========================================
// 世界杯票务系统 - 人流分析引擎
// ==========================================
// 输入: 比赛的全部 FlowRecord
// 输出: FlowAnalysis (均值/峰值/拥堵区域/评分/建议/疏散时间)
// 纯计算，不访问数据库
// ==========================================

use crate::config::policy::FlowPolicy;
use crate::domain::flow::{FlowAnalysis, FlowRecord};
use crate::domain::types::AnalysisStatus;
use chrono::NaiveDateTime;
use tracing::instrument;
use uuid::Uuid;

pub const RECO_OPEN_GATES: &str = "平均密度偏高，建议开放更多入场闸口";
pub const RECO_OVERCAPACITY: &str = "紧急: 检测到区域超员，需立即处置";
pub const RECO_REDISTRIBUTE: &str = "效率评分偏低，建议引导观众向低密度区域分流";
pub const RECO_OPTIMAL: &str = "人流状况良好，无需干预";

pub struct FlowAnalyzer {
    policy: FlowPolicy,
}

impl FlowAnalyzer {
    pub fn new(policy: FlowPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FlowPolicy {
        &self.policy
    }

    /// 分析一场比赛的人流
    ///
    /// - records 为空 → NO_DATA，无建议，无疏散估算
    /// - gate_count 为空时使用策略默认闸口数
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn analyze(
        &self,
        match_id: &str,
        records: &[FlowRecord],
        total_occupancy: i64,
        gate_count: Option<i64>,
        now: NaiveDateTime,
    ) -> FlowAnalysis {
        if records.is_empty() {
            return FlowAnalysis {
                analysis_id: Uuid::new_v4().to_string(),
                match_id: match_id.to_string(),
                analyzed_at: now,
                status: AnalysisStatus::NoData,
                density_mean: 0.0,
                density_max: 0.0,
                efficiency_score: 0.0,
                congested_zones: Vec::new(),
                recommendations: Vec::new(),
                evacuation_minutes: None,
            };
        }

        let total: f64 = records.iter().map(|r| r.density).sum();
        let density_mean = total / records.len() as f64;
        let density_max = records.iter().map(|r| r.density).fold(0.0_f64, f64::max);
        let congested_zones: Vec<String> = records
            .iter()
            .filter(|r| r.density > self.policy.congestion_threshold)
            .map(|r| r.zone_name.clone())
            .collect();

        let efficiency_score = self.efficiency_score(density_mean, density_max);
        let recommendations =
            self.recommendations(density_mean, density_max, &congested_zones, efficiency_score);
        let gates = gate_count.unwrap_or(self.policy.default_gate_count);

        FlowAnalysis {
            analysis_id: Uuid::new_v4().to_string(),
            match_id: match_id.to_string(),
            analyzed_at: now,
            status: AnalysisStatus::Completed,
            density_mean,
            density_max,
            efficiency_score,
            congested_zones,
            recommendations,
            evacuation_minutes: self.estimate_evacuation_minutes(total_occupancy, gates),
        }
    }

    /// 效率评分 = clamp(0, 100, 100 - mean - max(0, (max - 80) × 0.5))
    pub fn efficiency_score(&self, density_mean: f64, density_max: f64) -> f64 {
        let penalty = if density_max > self.policy.penalty_start {
            (density_max - self.policy.penalty_start) * self.policy.penalty_factor
        } else {
            0.0
        };
        (100.0 - density_mean - penalty).clamp(0.0, 100.0)
    }

    /// 按固定顺序生成建议；均不触发时仅返回"良好"
    pub fn recommendations(
        &self,
        density_mean: f64,
        density_max: f64,
        congested_zones: &[String],
        efficiency_score: f64,
    ) -> Vec<String> {
        let mut reco = Vec::new();
        if density_mean > self.policy.mean_warning_threshold {
            reco.push(RECO_OPEN_GATES.to_string());
        }
        if density_max > self.policy.congestion_threshold {
            reco.push(RECO_OVERCAPACITY.to_string());
        }
        if !congested_zones.is_empty() {
            reco.push(format!("需重点关注的区域: {}", congested_zones.join(", ")));
        }
        if efficiency_score < self.policy.low_score_threshold {
            reco.push(RECO_REDISTRIBUTE.to_string());
        }
        if reco.is_empty() {
            reco.push(RECO_OPTIMAL.to_string());
        }
        reco
    }

    /// 疏散时间（分钟）= ceil(total / (gates × 每闸口每分钟通过人数))
    ///
    /// 闸口数或通过能力非正、或总通过能力溢出时无法估算
    pub fn estimate_evacuation_minutes(&self, total_occupancy: i64, gate_count: i64) -> Option<i64> {
        if gate_count <= 0 {
            return None;
        }
        let throughput = gate_count
            .checked_mul(self.policy.throughput_per_gate)
            .filter(|t| *t > 0)?;
        let total = total_occupancy.max(0);
        Some(total / throughput + i64::from(total % throughput != 0))
    }
}

impl Default for FlowAnalyzer {
    fn default() -> Self {
        Self::new(FlowPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 7, 21)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap()
    }

    fn record(name: &str, density: f64) -> FlowRecord {
        FlowRecord {
            flow_id: format!("f-{}", name),
            match_id: "m1".to_string(),
            zone_id: format!("z-{}", name),
            zone_name: name.to_string(),
            recorded_at: now(),
            entries: 0,
            exits: 0,
            occupancy: density as i64,
            capacity: 100,
            density,
            gate: None,
        }
    }

    #[test]
    fn test_reference_densities() {
        let analyzer = FlowAnalyzer::default();
        let records = vec![record("North", 50.0), record("South", 95.0), record("VIP", 100.0)];
        let a = analyzer.analyze("m1", &records, 245, None, now());

        assert_eq!(a.status, AnalysisStatus::Completed);
        assert!((a.density_max - 100.0).abs() < 1e-9);
        assert!((a.density_mean - 81.6667).abs() < 1e-3);
        assert!((a.efficiency_score - 8.3333).abs() < 1e-3);
        assert_eq!(a.congested_zones, vec!["South".to_string(), "VIP".to_string()]);

        assert_eq!(a.recommendations.len(), 4);
        assert_eq!(a.recommendations[0], RECO_OPEN_GATES);
        assert_eq!(a.recommendations[1], RECO_OVERCAPACITY);
        assert!(a.recommendations[2].contains("South, VIP"));
        assert_eq!(a.recommendations[3], RECO_REDISTRIBUTE);
        // 245 / (8 × 50) → 1 分钟
        assert_eq!(a.evacuation_minutes, Some(1));
    }

    #[test]
    fn test_empty_input_is_no_data() {
        let a = FlowAnalyzer::default().analyze("m1", &[], 0, None, now());
        assert_eq!(a.status, AnalysisStatus::NoData);
        assert!(a.recommendations.is_empty());
        assert_eq!(a.evacuation_minutes, None);
    }

    #[test]
    fn test_optimal_when_nothing_triggers() {
        let analyzer = FlowAnalyzer::default();
        let a = analyzer.analyze("m1", &[record("East", 20.0), record("West", 40.0)], 60, Some(2), now());
        assert_eq!(a.recommendations, vec![RECO_OPTIMAL.to_string()]);
        assert!((a.efficiency_score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped() {
        let analyzer = FlowAnalyzer::default();
        assert_eq!(analyzer.efficiency_score(100.0, 100.0), 0.0);
        assert_eq!(analyzer.efficiency_score(0.0, 0.0), 100.0);
    }

    #[test]
    fn test_evacuation_estimate() {
        let analyzer = FlowAnalyzer::default();
        assert_eq!(analyzer.estimate_evacuation_minutes(1000, 8), Some(3));
        assert_eq!(analyzer.estimate_evacuation_minutes(400, 8), Some(1));
        assert_eq!(analyzer.estimate_evacuation_minutes(0, 8), Some(0));
        assert_eq!(analyzer.estimate_evacuation_minutes(100, 0), None);
        assert_eq!(analyzer.estimate_evacuation_minutes(i64::MAX, 8), Some(i64::MAX / 400 + 1));
    }

    #[test]
    fn test_evacuation_estimate_with_huge_gate_count() {
        let analyzer = FlowAnalyzer::default();
        assert_eq!(analyzer.estimate_evacuation_minutes(1000, i64::MAX), None);
        assert_eq!(analyzer.estimate_evacuation_minutes(1000, i64::MAX / 50), Some(1));

        let a = analyzer.analyze("m1", &[record("East", 20.0)], 20, Some(i64::MAX), now());
        assert_eq!(a.evacuation_minutes, None);
    }
}
