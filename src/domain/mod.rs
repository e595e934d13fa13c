// ==========================================
// 世界杯票务系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod fixture;
pub mod flow;
pub mod outcome;
pub mod ticket;
pub mod transaction;
pub mod types;
pub mod user;
pub mod zone;

// 重导出核心类型
pub use alert::Alert;
pub use fixture::{Match, Team, DEFAULT_BASE_PRICE};
pub use flow::{FlowAnalysis, FlowRecord};
pub use outcome::{Outcome, PurchaseReport, RefundReceipt, RejectReason, TransferReceipt};
pub use ticket::{Ticket, MAX_TRANSFERS};
pub use transaction::Transaction;
pub use types::{
    AlertLevel, AlertType, AnalysisStatus, MatchPhase, TicketCategory, TicketStatus,
    TransactionStatus, TransactionType, ZoneType,
};
pub use user::{AdminProfile, SpectatorProfile, User, UserRole};
pub use zone::{SeatInventory, Zone};
