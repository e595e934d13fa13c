// ==========================================
// 世界杯票务系统 - 看台区域领域模型
// ==========================================
// 对齐: v0.1_init.sql zone 表
// 不变量: 0 <= available <= capacity
// ==========================================

use crate::domain::types::ZoneType;
use serde::{Deserialize, Serialize};

// ==========================================
// Zone - 看台区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: String,
    pub match_id: String, // 所属比赛（唯一）
    pub name: String,
    pub zone_type: ZoneType,

    // ===== 座位计数 =====
    pub capacity: i64,
    pub available: i64,

    pub price_coefficient: f64,
    pub pmr_accessible: bool,
    pub gate: Option<String>, // 入场闸口
}

// ==========================================
// Trait: SeatInventory
// ==========================================
// 用途: 区域与比赛共用的座位计数视图
pub trait SeatInventory {
    fn seat_capacity(&self) -> i64;
    fn seats_available(&self) -> i64;

    /// 上座率 (%) = (capacity - available) / capacity × 100
    ///
    /// 容量为 0 时返回 0
    fn occupancy_rate(&self) -> f64 {
        let capacity = self.seat_capacity();
        if capacity <= 0 {
            return 0.0;
        }
        (capacity - self.seats_available()) as f64 / capacity as f64 * 100.0
    }

    fn has_available(&self) -> bool {
        self.seats_available() > 0
    }
}

impl SeatInventory for Zone {
    fn seat_capacity(&self) -> i64 {
        self.capacity
    }

    fn seats_available(&self) -> i64 {
        self.available
    }
}

impl SeatInventory for crate::domain::fixture::Match {
    fn seat_capacity(&self) -> i64 {
        self.capacity
    }

    fn seats_available(&self) -> i64 {
        self.tickets_available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(capacity: i64, available: i64) -> Zone {
        Zone {
            zone_id: "z1".to_string(),
            match_id: "m1".to_string(),
            name: "North Stand".to_string(),
            zone_type: ZoneType::NorthStand,
            capacity,
            available,
            price_coefficient: 1.0,
            pmr_accessible: false,
            gate: Some("Gate N".to_string()),
        }
    }

    #[test]
    fn test_occupancy_rate() {
        assert!((zone(100, 20).occupancy_rate() - 80.0).abs() < 1e-9);
        assert_eq!(zone(0, 0).occupancy_rate(), 0.0);
        assert!(!zone(10, 0).has_available());
    }
}
