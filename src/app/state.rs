// ==========================================
// 世界杯票务系统 - 应用状态
// ==========================================
// 职责: 显式构造并持有所有仓储、引擎与API实例（依赖注入，无全局单例）
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{AlertApi, FlowApi, MatchApi, TicketApi, UserApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::engine::{
    AlertTrigger, FlowAnalyzer, FlowMonitor, PaymentGateway, SimulatedPaymentGateway,
    TicketLifecycleManager, ZoneInventory,
};
use crate::perf::install_sqlite_tracing;
use crate::repository::{
    AlertRepository, FlowAnalysisRepository, FlowRepository, InventoryRepository,
    MatchRepository, TeamRepository, TicketRepository, TransactionRepository, UserRepository,
    ZoneRepository,
};

/// 应用状态
///
/// 所有组件共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub ticket_api: Arc<TicketApi>,
    pub flow_api: Arc<FlowApi>,
    pub match_api: Arc<MatchApi>,
    pub alert_api: Arc<AlertApi>,
    pub user_api: Arc<UserApi>,

    /// 配置管理器（运行期可调整阈值，重启后生效）
    pub config_manager: Arc<ConfigManager>,

    /// 引擎（供需要指定时间点的调用方直接使用）
    pub ticket_lifecycle: Arc<TicketLifecycleManager>,
    pub flow_monitor: Arc<FlowMonitor>,
    pub zone_inventory: Arc<ZoneInventory>,
}

impl AppState {
    /// 创建新的AppState实例（模拟支付网关，成功率取自配置）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        let conn = Self::open(&db_path)?;
        let config_manager = ConfigManager::from_connection(conn.clone());
        let rate = config_manager
            .ticketing_policy()
            .map_err(|e| format!("无法读取票务配置: {}", e))?
            .payment_success_rate;
        Self::assemble(
            db_path,
            conn,
            Arc::new(SimulatedPaymentGateway::new(rate)),
        )
    }

    /// 使用指定支付网关创建AppState
    pub fn with_payment_gateway(
        db_path: String,
        payment: Arc<dyn PaymentGateway>,
    ) -> Result<Self, String> {
        let conn = Self::open(&db_path)?;
        Self::assemble(db_path, conn, payment)
    }

    fn open(db_path: &str) -> Result<Arc<Mutex<Connection>>, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn =
            open_sqlite_connection(db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        match read_schema_version(&conn) {
            Ok(version) => tracing::info!(?version, "schema 版本"),
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }
        install_sqlite_tracing(&mut conn);

        Ok(Arc::new(Mutex::new(conn)))
    }

    fn assemble(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        payment: Arc<dyn PaymentGateway>,
    ) -> Result<Self, String> {
        // ==========================================
        // 配置
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let flow_policy = config_manager
            .flow_policy()
            .map_err(|e| format!("无法读取人流配置: {}", e))?;
        let alert_policy = config_manager
            .alert_policy()
            .map_err(|e| format!("无法读取告警配置: {}", e))?;
        let ticketing_policy = config_manager
            .ticketing_policy()
            .map_err(|e| format!("无法读取票务配置: {}", e))?;

        // ==========================================
        // Repository层
        // ==========================================
        let match_repo = Arc::new(MatchRepository::from_connection(conn.clone()));
        let zone_repo = Arc::new(ZoneRepository::from_connection(conn.clone()));
        let team_repo = Arc::new(TeamRepository::from_connection(conn.clone()));
        let user_repo = Arc::new(UserRepository::from_connection(conn.clone()));
        let ticket_repo = Arc::new(TicketRepository::from_connection(conn.clone()));
        let transaction_repo = Arc::new(TransactionRepository::from_connection(conn.clone()));
        let inventory_repo = Arc::new(InventoryRepository::from_connection(conn.clone()));
        let flow_repo = Arc::new(FlowRepository::from_connection(conn.clone()));
        let analysis_repo = Arc::new(FlowAnalysisRepository::from_connection(conn.clone()));
        let alert_repo = Arc::new(AlertRepository::from_connection(conn));

        // ==========================================
        // Engine层
        // ==========================================
        let zone_inventory = Arc::new(ZoneInventory::new(inventory_repo, zone_repo.clone()));
        let alert_trigger = Arc::new(AlertTrigger::new(alert_repo.clone(), alert_policy));
        let flow_monitor = Arc::new(FlowMonitor::new(
            match_repo.clone(),
            zone_repo.clone(),
            flow_repo.clone(),
            analysis_repo.clone(),
            alert_trigger,
            FlowAnalyzer::new(flow_policy),
        ));
        let ticket_lifecycle = Arc::new(TicketLifecycleManager::new(
            match_repo.clone(),
            zone_repo.clone(),
            user_repo.clone(),
            ticket_repo.clone(),
            transaction_repo.clone(),
            payment,
            ticketing_policy,
        ));

        // ==========================================
        // API层
        // ==========================================
        let ticket_api = Arc::new(TicketApi::new(
            ticket_lifecycle.clone(),
            match_repo.clone(),
            zone_repo.clone(),
            ticket_repo.clone(),
            transaction_repo,
        ));
        let flow_api = Arc::new(FlowApi::new(
            flow_monitor.clone(),
            flow_repo,
            analysis_repo,
        ));
        let match_api = Arc::new(MatchApi::new(
            match_repo,
            zone_repo,
            team_repo,
            ticket_repo,
            zone_inventory.clone(),
        ));
        let alert_api = Arc::new(AlertApi::new(alert_repo, user_repo.clone()));
        let user_api = Arc::new(UserApi::new(user_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            ticket_api,
            flow_api,
            match_api,
            alert_api,
            user_api,
            config_manager,
            ticket_lifecycle,
            flow_monitor,
            zone_inventory,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// 优先级: WORLDCUP_TICKETING_DB_PATH > 用户数据目录 > ./worldcup_ticketing.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("WORLDCUP_TICKETING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./worldcup_ticketing.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("worldcup-ticketing-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("worldcup-ticketing");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("worldcup_ticketing.db");
        }
    }

    path.to_string_lossy().to_string()
}
