// ==========================================
// 世界杯票务系统 - 业务结果类型
// ==========================================
// 业务规则失败（售罄、状态不允许、未找到、支付拒绝）以值返回，
// 只有持久化故障才走 Err
// ==========================================

use crate::domain::ticket::Ticket;
use crate::domain::transaction::Transaction;
use crate::domain::types::TicketStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RejectReason - 拒绝原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    // ===== 未找到 =====
    MatchNotFound { match_id: String },
    ZoneNotFound { zone_id: String },
    SpectatorNotFound { user_id: String },
    RecipientNotFound { email: String },
    TicketNotFound { ticket_id: String },
    UnknownQrCode,

    // ===== 库存 =====
    MatchSoldOut,
    ZoneSoldOut { zone_id: String },
    ZoneNotInMatch { zone_id: String, match_id: String },

    // ===== 输入 =====
    InvalidQuantity { quantity: u32 },
    NotSpectator { user_id: String },

    // ===== 支付 =====
    PaymentRefused { reference: String },

    // ===== 状态 =====
    TicketNotValid { status: TicketStatus },
    TicketAlreadyUsed,
    TicketExpired,
    EventOver,
    MatchNotUpcoming,
    NotTransferable,
    TransferLimitReached { limit: i32 },
    SameOwner,
    AlreadyRefunded,

    // ===== 比赛管理 =====
    MatchHasTickets { count: i64 },
}

impl RejectReason {
    /// 稳定错误码（供界面/日志区分）
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MatchNotFound { .. } => "MATCH_NOT_FOUND",
            RejectReason::ZoneNotFound { .. } => "ZONE_NOT_FOUND",
            RejectReason::SpectatorNotFound { .. } => "SPECTATOR_NOT_FOUND",
            RejectReason::RecipientNotFound { .. } => "RECIPIENT_NOT_FOUND",
            RejectReason::TicketNotFound { .. } => "TICKET_NOT_FOUND",
            RejectReason::UnknownQrCode => "UNKNOWN_QR_CODE",
            RejectReason::MatchSoldOut => "MATCH_SOLD_OUT",
            RejectReason::ZoneSoldOut { .. } => "ZONE_SOLD_OUT",
            RejectReason::ZoneNotInMatch { .. } => "ZONE_NOT_IN_MATCH",
            RejectReason::InvalidQuantity { .. } => "INVALID_QUANTITY",
            RejectReason::NotSpectator { .. } => "NOT_SPECTATOR",
            RejectReason::PaymentRefused { .. } => "PAYMENT_REFUSED",
            RejectReason::TicketNotValid { .. } => "TICKET_NOT_VALID",
            RejectReason::TicketAlreadyUsed => "TICKET_ALREADY_USED",
            RejectReason::TicketExpired => "TICKET_EXPIRED",
            RejectReason::EventOver => "EVENT_OVER",
            RejectReason::MatchNotUpcoming => "MATCH_NOT_UPCOMING",
            RejectReason::NotTransferable => "NOT_TRANSFERABLE",
            RejectReason::TransferLimitReached { .. } => "TRANSFER_LIMIT_REACHED",
            RejectReason::SameOwner => "SAME_OWNER",
            RejectReason::AlreadyRefunded => "ALREADY_REFUNDED",
            RejectReason::MatchHasTickets { .. } => "MATCH_HAS_TICKETS",
        }
    }

    /// 库存耗尽类拒绝（购票循环据此提前结束）
    pub fn is_capacity_exhausted(&self) -> bool {
        matches!(
            self,
            RejectReason::MatchSoldOut | RejectReason::ZoneSoldOut { .. }
        )
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MatchNotFound { match_id } => write!(f, "比赛不存在: {}", match_id),
            RejectReason::ZoneNotFound { zone_id } => write!(f, "区域不存在: {}", zone_id),
            RejectReason::SpectatorNotFound { user_id } => write!(f, "观众不存在: {}", user_id),
            RejectReason::RecipientNotFound { email } => write!(f, "受让人不存在: {}", email),
            RejectReason::TicketNotFound { ticket_id } => write!(f, "门票不存在: {}", ticket_id),
            RejectReason::UnknownQrCode => write!(f, "无法识别的二维码"),
            RejectReason::MatchSoldOut => write!(f, "余票不足"),
            RejectReason::ZoneSoldOut { zone_id } => write!(f, "区域座位已满: {}", zone_id),
            RejectReason::ZoneNotInMatch { zone_id, match_id } => {
                write!(f, "区域 {} 不属于比赛 {}", zone_id, match_id)
            }
            RejectReason::InvalidQuantity { quantity } => write!(f, "购票数量无效: {}", quantity),
            RejectReason::NotSpectator { user_id } => write!(f, "用户不是观众: {}", user_id),
            RejectReason::PaymentRefused { reference } => write!(f, "支付被拒绝: {}", reference),
            RejectReason::TicketNotValid { status } => write!(f, "门票状态不允许该操作: {}", status),
            RejectReason::TicketAlreadyUsed => write!(f, "门票已使用"),
            RejectReason::TicketExpired => write!(f, "门票已过期"),
            RejectReason::EventOver => write!(f, "比赛已结束"),
            RejectReason::MatchNotUpcoming => write!(f, "比赛已开始或已结束"),
            RejectReason::NotTransferable => write!(f, "门票不可转让"),
            RejectReason::TransferLimitReached { limit } => write!(f, "已达转让上限: {}", limit),
            RejectReason::SameOwner => write!(f, "受让人即当前持有人"),
            RejectReason::AlreadyRefunded => write!(f, "门票已退款"),
            RejectReason::MatchHasTickets { count } => write!(f, "比赛已有 {} 张门票，禁止删除", count),
        }
    }
}

// ==========================================
// Outcome - 业务结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome<T> {
    Accepted(T),
    Rejected(RejectReason),
}

impl<T> Outcome<T> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted(_))
    }

    pub fn accepted(self) -> Option<T> {
        match self {
            Outcome::Accepted(v) => Some(v),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            Outcome::Accepted(_) => None,
            Outcome::Rejected(r) => Some(r),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Accepted(v) => Outcome::Accepted(f(v)),
            Outcome::Rejected(r) => Outcome::Rejected(r),
        }
    }
}

// ==========================================
// 回执
// ==========================================

/// 购票报告: 成功的票 + 每个失败单位的原因
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseReport {
    pub requested: u32,
    pub tickets: Vec<Ticket>,
    pub rejections: Vec<RejectReason>,
}

impl PurchaseReport {
    pub fn new(requested: u32) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    pub fn purchased_count(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_complete(&self) -> bool {
        self.tickets.len() == self.requested as usize
    }

    pub fn total_amount(&self) -> f64 {
        self.tickets.iter().map(|t| t.price).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub ticket: Ticket,
    pub previous_owner_id: Option<String>,
    pub new_owner_id: String,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub ticket: Ticket,
    pub refund: Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_codes_are_distinct_for_ui() {
        assert_eq!(RejectReason::MatchSoldOut.code(), "MATCH_SOLD_OUT");
        assert_ne!(
            RejectReason::NotTransferable.code(),
            RejectReason::TransferLimitReached { limit: 3 }.code()
        );
        assert!(RejectReason::ZoneSoldOut { zone_id: "z".into() }.is_capacity_exhausted());
        assert!(!RejectReason::PaymentRefused { reference: "r".into() }.is_capacity_exhausted());
    }

    #[test]
    fn test_outcome_helpers() {
        let ok: Outcome<i32> = Outcome::Accepted(2);
        assert_eq!(ok.clone().map(|v| v * 2).accepted(), Some(4));
        assert!(ok.rejection().is_none());

        let no: Outcome<i32> = Outcome::Rejected(RejectReason::EventOver);
        assert!(!no.is_accepted());
        assert_eq!(no.rejection().map(|r| r.code()), Some("EVENT_OVER"));
    }
}
