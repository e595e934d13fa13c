// ==========================================
// 世界杯票务系统 - 比赛领域模型
// ==========================================
// 对齐: v0.1_init.sql fixture / team 表
// 不变量: 0 <= tickets_available <= capacity
// ==========================================

use crate::domain::types::MatchPhase;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 缺省基础票价（比赛未设置 base_price 时使用）
pub const DEFAULT_BASE_PRICE: f64 = 100.0;

// ==========================================
// Team - 参赛球队
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    pub name: String,
    pub country_code: Option<String>,
    pub group_name: Option<String>,
}

// ==========================================
// Match - 比赛
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    // ===== 主键 =====
    pub match_id: String,
    pub match_code: String, // 如 GR-A1B2C3

    // ===== 对阵 =====
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,

    // ===== 场地与时间 =====
    pub kickoff_at: NaiveDateTime,
    pub stadium: String,
    pub city: Option<String>,
    pub phase: MatchPhase,
    pub group_name: Option<String>,

    // ===== 票务计数 =====
    pub base_price: Option<f64>,
    pub capacity: i64,
    pub tickets_available: i64,

    // ===== 赛果 =====
    pub completed: bool,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl Match {
    /// 未开赛且未结束
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.kickoff_at > now
    }

    /// 生效基础票价
    pub fn effective_base_price(&self) -> f64 {
        self.base_price.unwrap_or(DEFAULT_BASE_PRICE)
    }

    /// 已售出数量
    pub fn tickets_sold(&self) -> i64 {
        (self.capacity - self.tickets_available).max(0)
    }

    /// 售票率 (%)，容量为 0 时返回 0
    pub fn fill_rate(&self) -> f64 {
        if self.capacity <= 0 {
            return 0.0;
        }
        self.tickets_sold() as f64 / self.capacity as f64 * 100.0
    }

    pub fn is_sold_out(&self) -> bool {
        self.tickets_available <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(kickoff: NaiveDateTime) -> Match {
        Match {
            match_id: "m1".to_string(),
            match_code: "GR-000001".to_string(),
            home_team_id: None,
            away_team_id: None,
            kickoff_at: kickoff,
            stadium: "Stade de Casablanca".to_string(),
            city: None,
            phase: MatchPhase::GroupStage,
            group_name: Some("A".to_string()),
            base_price: None,
            capacity: 200,
            tickets_available: 150,
            completed: false,
            home_score: None,
            away_score: None,
        }
    }

    #[test]
    fn test_upcoming_and_fill_rate() {
        let now = NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut m = sample(now + chrono::Duration::days(3));

        assert!(m.is_upcoming(now));
        assert_eq!(m.effective_base_price(), DEFAULT_BASE_PRICE);
        assert!((m.fill_rate() - 25.0).abs() < 1e-9);

        m.completed = true;
        assert!(!m.is_upcoming(now));

        let past = sample(now - chrono::Duration::hours(1));
        assert!(!past.is_upcoming(now));
    }
}
