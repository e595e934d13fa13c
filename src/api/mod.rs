// ==========================================
// 世界杯票务系统 - API 层
// ==========================================
// 职责: 对外业务接口（进程内调用），负责输入校验与取当前时间
// ==========================================

use chrono::NaiveDateTime;

pub mod alert_api;
pub mod error;
pub mod flow_api;
pub mod match_api;
pub mod ticket_api;
pub mod user_api;

// 重导出核心类型
pub use alert_api::AlertApi;
pub use error::{ApiError, ApiResult};
pub use flow_api::FlowApi;
pub use match_api::{MatchApi, MatchStats, ScheduleMatchRequest};
pub use ticket_api::TicketApi;
pub use user_api::{RegisterUserRequest, UserApi};

/// 当前本地时间（与库内时间戳同为无时区格式）
pub(crate) fn clock_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
