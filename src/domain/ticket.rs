// ==========================================
// 世界杯票务系统 - 门票领域模型
// ==========================================
// 对齐: v0.1_init.sql ticket 表
// 状态机: 见 TicketStatus::can_transition_to
// ==========================================

use crate::domain::types::{TicketCategory, TicketStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 票号前缀
pub const TICKET_NUMBER_PREFIX: &str = "WC2030-";

/// 单张门票最多转让次数
pub const MAX_TRANSFERS: i32 = 3;

// ==========================================
// Ticket - 门票
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub ticket_number: String, // WC2030-XXXXXXXXXXXX
    pub qr_code: String,       // 闸机扫码凭证，转让后重新签发

    pub match_id: String,
    pub owner_id: Option<String>,
    pub zone_id: Option<String>,
    pub seat_label: Option<String>,

    pub category: TicketCategory,
    pub status: TicketStatus,
    pub price: f64,

    // ===== 转让 =====
    pub transferable: bool,
    pub transfer_count: i32,

    // ===== 时间戳 =====
    pub purchased_at: Option<NaiveDateTime>,
    pub validated_at: Option<NaiveDateTime>,
    pub used_at: Option<NaiveDateTime>,
    pub expires_at: Option<NaiveDateTime>,
}

impl Ticket {
    /// 创建一张预留状态的新票（票号与二维码即时生成）
    pub fn reserve(
        match_id: &str,
        owner_id: &str,
        zone_id: Option<&str>,
        category: TicketCategory,
        price: f64,
    ) -> Self {
        Self {
            ticket_id: Uuid::new_v4().to_string(),
            ticket_number: generate_ticket_number(),
            qr_code: generate_qr_token(),
            match_id: match_id.to_string(),
            owner_id: Some(owner_id.to_string()),
            zone_id: zone_id.map(str::to_string),
            seat_label: None,
            category,
            status: TicketStatus::Reserved,
            price,
            transferable: true,
            transfer_count: 0,
            purchased_at: None,
            validated_at: None,
            used_at: None,
            expires_at: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == TicketStatus::Valid
    }

    /// 是否仍可转让（不含比赛时间判断）
    pub fn can_be_transferred(&self, max_transfers: i32) -> bool {
        self.is_valid() && self.transferable && self.transfer_count < max_transfers
    }

    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }
}

/// 生成票号: WC2030- + 12 位大写十六进制
pub fn generate_ticket_number() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}{}", TICKET_NUMBER_PREFIX, &hex[..12])
}

/// 生成新的二维码令牌
pub fn generate_qr_token() -> String {
    Uuid::new_v4().to_string()
}
