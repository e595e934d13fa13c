// ==========================================
// 世界杯票务系统 - 票价计算
// ==========================================
// price = base × 票种系数 × 区域系数 × 阶段倍率
// 纯函数，无副作用
// ==========================================

use crate::domain::fixture::{Match, DEFAULT_BASE_PRICE};
use crate::domain::types::{MatchPhase, TicketCategory};
use crate::domain::zone::Zone;

pub struct PricingCalculator {
    default_base_price: f64,
}

impl PricingCalculator {
    pub fn new() -> Self {
        Self {
            default_base_price: DEFAULT_BASE_PRICE,
        }
    }

    /// 指定缺省基础票价（base_price 为空时使用）
    pub fn with_default_base_price(default_base_price: f64) -> Self {
        Self { default_base_price }
    }

    /// 不含区域系数的票价
    pub fn calculate_price(
        &self,
        base_price: Option<f64>,
        category: TicketCategory,
        phase: MatchPhase,
    ) -> f64 {
        self.calculate_zone_price(base_price, category, 1.0, phase)
    }

    /// 含区域系数的票价（票种系数与区域系数直接相乘）
    pub fn calculate_zone_price(
        &self,
        base_price: Option<f64>,
        category: TicketCategory,
        zone_coefficient: f64,
        phase: MatchPhase,
    ) -> f64 {
        let base = base_price.unwrap_or(self.default_base_price);
        base * category.price_coefficient() * zone_coefficient * phase.price_multiplier()
    }

    /// 按比赛与可选区域定价
    pub fn price_for(&self, m: &Match, zone: Option<&Zone>, category: TicketCategory) -> f64 {
        let zone_coefficient = zone.map(|z| z.price_coefficient).unwrap_or(1.0);
        self.calculate_zone_price(m.base_price, category, zone_coefficient, m.phase)
    }
}

impl Default for PricingCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_prices() {
        let calc = PricingCalculator::new();
        assert!(approx(
            calc.calculate_price(Some(100.0), TicketCategory::Vip, MatchPhase::Final),
            1500.0
        ));
        assert!(approx(
            calc.calculate_price(Some(100.0), TicketCategory::Standard, MatchPhase::GroupStage),
            100.0
        ));
    }

    #[test]
    fn test_missing_base_price_falls_back() {
        let calc = PricingCalculator::new();
        assert!(approx(
            calc.calculate_price(None, TicketCategory::Student, MatchPhase::SemiFinal),
            100.0 * 0.6 * 2.0
        ));
        let custom = PricingCalculator::with_default_base_price(80.0);
        assert!(approx(
            custom.calculate_price(None, TicketCategory::Standard, MatchPhase::GroupStage),
            80.0
        ));
    }

    #[test]
    fn test_zone_coefficient_compounds_with_category() {
        let calc = PricingCalculator::new();
        // VIP 票种 × VIP 区域 (3.0) × 1/4 决赛
        assert!(approx(
            calc.calculate_zone_price(Some(100.0), TicketCategory::Vip, 3.0, MatchPhase::QuarterFinal),
            100.0 * 5.0 * 3.0 * 1.5
        ));
    }
}
