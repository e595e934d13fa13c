// ==========================================
// 世界杯票务系统 - 交易流水领域模型
// ==========================================
// 对齐: v0.1_init.sql ledger_transaction 表
// ==========================================

use crate::domain::types::{TransactionStatus, TransactionType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub reference: String, // TRX-XXXXXXXXXXXX
    pub user_id: Option<String>,
    pub ticket_id: Option<String>,

    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: f64,
    pub currency: String,
    pub payment_method: Option<String>,

    // ===== 转让双方 =====
    pub source_user_id: Option<String>,
    pub destination_user_id: Option<String>,

    pub created_at: NaiveDateTime,
    pub validated_at: Option<NaiveDateTime>,
}

impl Transaction {
    /// 新建一条待处理流水
    pub fn pending(
        tx_type: TransactionType,
        user_id: Option<&str>,
        ticket_id: Option<&str>,
        amount: f64,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            reference: generate_reference(),
            user_id: user_id.map(str::to_string),
            ticket_id: ticket_id.map(str::to_string),
            tx_type,
            status: TransactionStatus::Pending,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method: None,
            source_user_id: None,
            destination_user_id: None,
            created_at: now,
            validated_at: None,
        }
    }

    pub fn validate(&mut self, now: NaiveDateTime) {
        self.status = TransactionStatus::Validated;
        self.validated_at = Some(now);
    }

    pub fn refuse(&mut self) {
        self.status = TransactionStatus::Refused;
    }

    /// 可退款: 已确认的购票流水，且比赛尚未开始
    pub fn is_refundable(&self, match_upcoming: bool) -> bool {
        self.tx_type == TransactionType::Purchase
            && self.status == TransactionStatus::Validated
            && match_upcoming
    }
}

/// 生成流水参考号
pub fn generate_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("TRX-{}", &hex[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_refund_eligibility() {
        let now = NaiveDate::from_ymd_opt(2030, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut tx = Transaction::pending(TransactionType::Purchase, Some("u1"), Some("t1"), 120.0, now);
        assert!(!tx.is_refundable(true));

        tx.validate(now);
        assert!(tx.is_refundable(true));
        assert!(!tx.is_refundable(false));

        tx.status = TransactionStatus::Refunded;
        assert!(!tx.is_refundable(true));
        assert!(tx.reference.starts_with("TRX-"));
    }
}
