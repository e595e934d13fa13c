// ==========================================
// 世界杯票务系统 - 引擎层
// ==========================================
// 职责: 实现票务/库存/人流业务规则
// 红线: Engine 不拼 SQL，业务拒绝必须给出原因
// ==========================================

pub mod alert_trigger;
pub mod flow_analyzer;
pub mod flow_monitor;
pub mod payment;
pub mod pricing;
pub mod ticket_lifecycle;
pub mod zone_inventory;

// 重导出核心引擎
pub use alert_trigger::AlertTrigger;
pub use flow_analyzer::FlowAnalyzer;
pub use flow_monitor::{initial_flow_record, FlowMonitor, SweepReport};
pub use payment::{
    FixedPaymentGateway, PaymentGateway, ScriptedPaymentGateway, SimulatedPaymentGateway,
};
pub use pricing::PricingCalculator;
pub use ticket_lifecycle::TicketLifecycleManager;
pub use zone_inventory::ZoneInventory;
