// ==========================================
// 世界杯票务系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 为枚举生成 数据库字符串 <-> 枚举 的双向映射与 Display
macro_rules! impl_db_str {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// 转换为数据库存储的字符串
            pub fn to_db_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }

            /// 从数据库字符串解析（大小写不敏感，未知值返回 None）
            pub fn from_db_str(s: &str) -> Option<Self> {
                match s.trim().to_uppercase().as_str() {
                    $($text => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.to_db_str())
            }
        }
    };
}

// ==========================================
// 比赛阶段 (Match Phase)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchPhase {
    GroupStage,   // 小组赛
    RoundOf16,    // 1/8 决赛
    QuarterFinal, // 1/4 决赛
    SemiFinal,    // 半决赛
    ThirdPlace,   // 三四名决赛
    Final,        // 决赛
}

impl_db_str!(MatchPhase {
    GroupStage => "GROUP_STAGE",
    RoundOf16 => "ROUND_OF_16",
    QuarterFinal => "QUARTER_FINAL",
    SemiFinal => "SEMI_FINAL",
    ThirdPlace => "THIRD_PLACE",
    Final => "FINAL",
});

impl MatchPhase {
    /// 阶段票价倍率（固定常量）
    pub fn price_multiplier(&self) -> f64 {
        match self {
            MatchPhase::GroupStage => 1.0,
            MatchPhase::RoundOf16 => 1.2,
            MatchPhase::QuarterFinal => 1.5,
            MatchPhase::SemiFinal => 2.0,
            MatchPhase::ThirdPlace => 1.8,
            MatchPhase::Final => 3.0,
        }
    }

    /// 比赛编号前缀
    pub fn code_prefix(&self) -> &'static str {
        match self {
            MatchPhase::GroupStage => "GR",
            MatchPhase::RoundOf16 => "R16",
            MatchPhase::QuarterFinal => "QF",
            MatchPhase::SemiFinal => "SF",
            MatchPhase::ThirdPlace => "PF",
            MatchPhase::Final => "FIN",
        }
    }
}

// ==========================================
// 票种 (Ticket Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketCategory {
    Standard,
    Premium,
    Vip,
    Family,
    Pmr, // 行动不便人士
    Student,
}

impl_db_str!(TicketCategory {
    Standard => "STANDARD",
    Premium => "PREMIUM",
    Vip => "VIP",
    Family => "FAMILY",
    Pmr => "PMR",
    Student => "STUDENT",
});

impl TicketCategory {
    /// 票种价格系数
    pub fn price_coefficient(&self) -> f64 {
        match self {
            TicketCategory::Standard => 1.0,
            TicketCategory::Premium => 2.5,
            TicketCategory::Vip => 5.0,
            TicketCategory::Family => 0.8,
            TicketCategory::Pmr => 0.7,
            TicketCategory::Student => 0.6,
        }
    }
}

// ==========================================
// 票状态 (Ticket Status)
// ==========================================
// RESERVED → VALID → USED
// VALID → CANCELLED
// VALID → IN_TRANSFER → VALID
// 任意非终态 → EXPIRED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Reserved,
    Valid,
    Used,
    Cancelled,
    Expired,
    InTransfer,
    Refunded,
}

impl_db_str!(TicketStatus {
    Reserved => "RESERVED",
    Valid => "VALID",
    Used => "USED",
    Cancelled => "CANCELLED",
    Expired => "EXPIRED",
    InTransfer => "IN_TRANSFER",
    Refunded => "REFUNDED",
});

impl TicketStatus {
    /// 终态不再允许任何迁移
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Used
                | TicketStatus::Cancelled
                | TicketStatus::Expired
                | TicketStatus::Refunded
        )
    }

    /// 状态机迁移表
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, TicketStatus::Expired) => true,
            (TicketStatus::Reserved, TicketStatus::Valid) => true,
            (TicketStatus::Valid, TicketStatus::Used) => true,
            (TicketStatus::Valid, TicketStatus::Cancelled) => true,
            (TicketStatus::Valid, TicketStatus::InTransfer) => true,
            (TicketStatus::InTransfer, TicketStatus::Valid) => true,
            _ => false,
        }
    }
}

// ==========================================
// 交易类型 / 交易状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Purchase,
    Transfer,
    Refund,
    Cancellation,
    Modification,
}

impl_db_str!(TransactionType {
    Purchase => "PURCHASE",
    Transfer => "TRANSFER",
    Refund => "REFUND",
    Cancellation => "CANCELLATION",
    Modification => "MODIFICATION",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    InProgress,
    Validated,
    Refused,
    Cancelled,
    Refunded,
    Expired,
}

impl_db_str!(TransactionStatus {
    Pending => "PENDING",
    InProgress => "IN_PROGRESS",
    Validated => "VALIDATED",
    Refused => "REFUSED",
    Cancelled => "CANCELLED",
    Refunded => "REFUNDED",
    Expired => "EXPIRED",
});

// ==========================================
// 告警级别 (Alert Level)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl_db_str!(AlertLevel {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

impl AlertLevel {
    /// HIGH 及以上视为需要立即处理
    pub fn is_critical(&self) -> bool {
        *self >= AlertLevel::High
    }
}

// ==========================================
// 告警类型 (Alert Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    Overcrowding,
    Security,
    Technical,
    Fraud,
    Emergency,
    Information,
    Maintenance,
    UserReport,
    UserQuestion,
    Complaint,
    Assistance,
}

impl_db_str!(AlertType {
    Overcrowding => "OVERCROWDING",
    Security => "SECURITY",
    Technical => "TECHNICAL",
    Fraud => "FRAUD",
    Emergency => "EMERGENCY",
    Information => "INFORMATION",
    Maintenance => "MAINTENANCE",
    UserReport => "USER_REPORT",
    UserQuestion => "USER_QUESTION",
    Complaint => "COMPLAINT",
    Assistance => "ASSISTANCE",
});

// ==========================================
// 看台区域类型 (Zone Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    NorthStand,
    SouthStand,
    EastStand,
    WestStand,
    Vip,
    Press,
    Pmr,
    Family,
    Curve,
    Stand,
    Pitch,
}

impl_db_str!(ZoneType {
    NorthStand => "NORTH_STAND",
    SouthStand => "SOUTH_STAND",
    EastStand => "EAST_STAND",
    WestStand => "WEST_STAND",
    Vip => "VIP",
    Press => "PRESS",
    Pmr => "PMR",
    Family => "FAMILY",
    Curve => "CURVE",
    Stand => "STAND",
    Pitch => "PITCH",
});

impl ZoneType {
    /// 展示名称（同时用作默认区域名）
    pub fn label(&self) -> &'static str {
        match self {
            ZoneType::NorthStand => "North Stand",
            ZoneType::SouthStand => "South Stand",
            ZoneType::EastStand => "East Stand",
            ZoneType::WestStand => "West Stand",
            ZoneType::Vip => "VIP Zone",
            ZoneType::Press => "Press Zone",
            ZoneType::Pmr => "PMR Zone",
            ZoneType::Family => "Family Zone",
            ZoneType::Curve => "Curve",
            ZoneType::Stand => "Stand",
            ZoneType::Pitch => "Pitch",
        }
    }
}

// ==========================================
// 流量分析状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Completed, // 已完成
    NoData,    // 无流量数据
}

impl_db_str!(AnalysisStatus {
    Completed => "COMPLETED",
    NoData => "NO_DATA",
});
