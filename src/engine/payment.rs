// ==========================================
// 世界杯票务系统 - 支付网关
// ==========================================
// 支付结果为布尔值：拒绝是正常业务结果，不是错误
// ==========================================

use std::collections::VecDeque;
use std::sync::Mutex;

/// 支付网关
pub trait PaymentGateway: Send + Sync {
    /// 尝试扣款；true = 成功
    fn process_payment(&self, user_id: &str, amount: f64, reference: &str) -> bool;
}

// ==========================================
// SimulatedPaymentGateway - 概率模拟
// ==========================================
pub struct SimulatedPaymentGateway {
    success_rate: f64,
}

impl SimulatedPaymentGateway {
    /// success_rate 截断到 [0, 1]
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl Default for SimulatedPaymentGateway {
    fn default() -> Self {
        Self::new(0.95)
    }
}

impl PaymentGateway for SimulatedPaymentGateway {
    fn process_payment(&self, user_id: &str, amount: f64, reference: &str) -> bool {
        let approved = rand::random::<f64>() < self.success_rate;
        tracing::debug!(user_id, amount, reference, approved, "模拟支付");
        approved
    }
}

// ==========================================
// FixedPaymentGateway - 固定结果
// ==========================================
pub struct FixedPaymentGateway {
    approve: bool,
}

impl FixedPaymentGateway {
    pub fn approving() -> Self {
        Self { approve: true }
    }

    pub fn refusing() -> Self {
        Self { approve: false }
    }
}

impl PaymentGateway for FixedPaymentGateway {
    fn process_payment(&self, _user_id: &str, _amount: f64, _reference: &str) -> bool {
        self.approve
    }
}

// ==========================================
// ScriptedPaymentGateway - 按序给出结果
// ==========================================
// 序列耗尽后一律成功
pub struct ScriptedPaymentGateway {
    script: Mutex<VecDeque<bool>>,
}

impl ScriptedPaymentGateway {
    pub fn new(results: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
        }
    }
}

impl PaymentGateway for ScriptedPaymentGateway {
    fn process_payment(&self, _user_id: &str, _amount: f64, _reference: &str) -> bool {
        match self.script.lock() {
            Ok(mut script) => script.pop_front().unwrap_or(true),
            Err(_) => false,
        }
    }
}
