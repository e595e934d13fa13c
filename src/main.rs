// ==========================================
// 世界杯票务系统 - 主入口
// ==========================================
// 启动: 初始化日志与数据库，执行一次过期扫描并输出概况
// 用法: worldcup-ticketing [--json]
// ==========================================

use std::process::ExitCode;

use worldcup_ticketing::app::{get_default_db_path, AppState};
use worldcup_ticketing::{logging, APP_NAME, VERSION};

fn main() -> ExitCode {
    if std::env::args().any(|a| a == "--json") {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", APP_NAME);
    tracing::info!("系统版本: {}", VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("AppState初始化失败: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match state.ticket_api.expire_overdue_tickets() {
        Ok(n) => tracing::info!(expired = n, "过期扫描完成"),
        Err(e) => tracing::warn!("过期扫描失败: {}", e),
    }

    match state.match_api.list_upcoming() {
        Ok(matches) => {
            tracing::info!(upcoming = matches.len(), "待开赛比赛");
            for m in &matches {
                tracing::info!(
                    match_code = %m.match_code,
                    kickoff_at = %m.kickoff_at,
                    stadium = %m.stadium,
                    available = m.tickets_available,
                    capacity = m.capacity,
                    "比赛"
                );
            }
        }
        Err(e) => {
            tracing::error!("读取比赛失败: {}", e);
            return ExitCode::FAILURE;
        }
    }

    match state.alert_api.count_active() {
        Ok(n) => tracing::info!(active_alerts = n, "未处理告警"),
        Err(e) => tracing::warn!("读取告警失败: {}", e),
    }

    ExitCode::SUCCESS
}
