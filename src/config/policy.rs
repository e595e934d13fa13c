// ==========================================
// 世界杯票务系统 - 策略参数
// ==========================================
// 阈值为策略常量，可通过 config_kv 覆写
// 两套阈值相互独立:
//   分析器: 拥堵 90 / 罚分起点 80
//   告警:   入场 90/95，巡检 75/85/95
// ==========================================

use serde::{Deserialize, Serialize};

/// 人流分析参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPolicy {
    pub congestion_threshold: f64,  // 拥堵判定密度 (%)
    pub penalty_start: f64,         // 峰值罚分起点 (%)
    pub penalty_factor: f64,        // 每超 1 点扣分
    pub mean_warning_threshold: f64, // 平均密度提示开闸
    pub low_score_threshold: f64,   // 评分过低建议分流
    pub throughput_per_gate: i64,   // 人/分钟/闸口
    pub default_gate_count: i64,
}

impl Default for FlowPolicy {
    fn default() -> Self {
        Self {
            congestion_threshold: 90.0,
            penalty_start: 80.0,
            penalty_factor: 0.5,
            mean_warning_threshold: 70.0,
            low_score_threshold: 50.0,
            throughput_per_gate: 50,
            default_gate_count: 8,
        }
    }
}

/// 告警阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    // ===== 单次入场检查（人流密度） =====
    pub entry_high: f64,
    pub entry_critical: f64,

    // ===== 全场巡检（座位上座率） =====
    pub sweep_medium: f64,
    pub sweep_high: f64,
    pub sweep_critical: f64,

    // ===== 人流巡检 =====
    pub flow_sweep_critical: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            entry_high: 90.0,
            entry_critical: 95.0,
            sweep_medium: 75.0,
            sweep_high: 85.0,
            sweep_critical: 95.0,
            flow_sweep_critical: 95.0,
        }
    }
}

/// 售票参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketingPolicy {
    pub max_transfers: i32,
    pub default_base_price: f64,
    pub payment_method: String,
    pub currency: String,
    pub payment_success_rate: f64,
}

impl Default for TicketingPolicy {
    fn default() -> Self {
        Self {
            max_transfers: crate::domain::ticket::MAX_TRANSFERS,
            default_base_price: crate::domain::fixture::DEFAULT_BASE_PRICE,
            payment_method: "CARD".to_string(),
            currency: crate::domain::transaction::DEFAULT_CURRENCY.to_string(),
            payment_success_rate: 0.95,
        }
    }
}
