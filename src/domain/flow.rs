// ==========================================
// 世界杯票务系统 - 人流领域模型
// ==========================================
// 对齐: v0.1_init.sql flow_record / flow_analysis 表
// 不变量: occupancy >= 0（出场时在 0 处截断）
// ==========================================

use crate::domain::types::AnalysisStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// FlowRecord - 区域人流快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub flow_id: String,
    pub match_id: String,
    pub zone_id: String,
    pub zone_name: String, // 来自 zone 表（JOIN），不单独存储

    pub recorded_at: NaiveDateTime,
    pub entries: i64,   // 累计入场
    pub exits: i64,     // 累计出场
    pub occupancy: i64, // 当前在场人数
    pub capacity: i64,
    pub density: f64, // occupancy / capacity × 100
    pub gate: Option<String>,
}

impl FlowRecord {
    /// 按当前人数重新计算密度，容量为 0 时为 0
    pub fn compute_density(occupancy: i64, capacity: i64) -> f64 {
        if capacity <= 0 {
            return 0.0;
        }
        occupancy as f64 / capacity as f64 * 100.0
    }
}

// ==========================================
// FlowAnalysis - 比赛人流分析结果
// ==========================================
// 每次按需重新计算并追加一条历史记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAnalysis {
    pub analysis_id: String,
    pub match_id: String,
    pub analyzed_at: NaiveDateTime,
    pub status: AnalysisStatus,

    pub density_mean: f64,
    pub density_max: f64,
    pub efficiency_score: f64, // 0 - 100

    pub congested_zones: Vec<String>,
    pub recommendations: Vec<String>,
    pub evacuation_minutes: Option<i64>,
}

impl FlowAnalysis {
    /// 拥堵区域名称（逗号拼接，用于展示）
    pub fn congested_zones_label(&self) -> String {
        self.congested_zones.join(", ")
    }

    pub fn has_data(&self) -> bool {
        self.status != AnalysisStatus::NoData
    }
}
