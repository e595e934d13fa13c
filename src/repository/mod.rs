// ==========================================
// 世界杯票务系统 - 数据仓储层
// ==========================================
// 职责: 数据访问，条件计数更新，事务边界
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod alert_repo;
pub mod analysis_repo;
pub mod error;
pub mod flow_repo;
pub mod inventory_repo;
pub mod match_repo;
pub mod team_repo;
pub mod ticket_repo;
pub mod transaction_repo;
pub mod user_repo;
pub mod zone_repo;

pub use alert_repo::AlertRepository;
pub use analysis_repo::FlowAnalysisRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use flow_repo::FlowRepository;
pub use inventory_repo::InventoryRepository;
pub use match_repo::MatchRepository;
pub use team_repo::TeamRepository;
pub use ticket_repo::{PurchaseCommit, TicketRepository, TransferCommand};
pub use transaction_repo::TransactionRepository;
pub use user_repo::UserRepository;
pub use zone_repo::ZoneRepository;
