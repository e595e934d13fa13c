// ==========================================
// 世界杯票务系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 票务库存与观众流量核算（售票、转让、核验、退票、人流分析、告警）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 策略阈值
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能观测（SQL 计数/慢查询）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertLevel, AlertType, MatchPhase, TicketCategory, TicketStatus, TransactionStatus,
    TransactionType, ZoneType,
};

// 领域实体
pub use domain::{
    Alert, FlowAnalysis, FlowRecord, Match, Outcome, PurchaseReport, RejectReason, Ticket,
    Transaction, User, Zone,
};

// 引擎
pub use engine::{
    AlertTrigger, FlowAnalyzer, FlowMonitor, PaymentGateway, PricingCalculator,
    TicketLifecycleManager, ZoneInventory,
};

// API
pub use api::{AlertApi, ApiError, ApiResult, FlowApi, MatchApi, TicketApi, UserApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "世界杯票务系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(DB_VERSION, "v0.1");
    }
}
