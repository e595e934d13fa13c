// ==========================================
// 世界杯票务系统 - 配置层
// ==========================================
// 职责: 策略阈值与售票参数，支持 config_kv 覆写
// ==========================================

pub mod config_manager;
pub mod policy;

pub use config_manager::{config_keys, ConfigManager};
pub use policy::{AlertPolicy, FlowPolicy, TicketingPolicy};
