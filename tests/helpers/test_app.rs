// ==========================================
// 测试应用 - 临时数据库上的完整 AppState
// ==========================================

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tempfile::NamedTempFile;

use worldcup_ticketing::app::AppState;
use worldcup_ticketing::logging;
use worldcup_ticketing::domain::{Match, User, Zone, ZoneType};
use worldcup_ticketing::engine::{FixedPaymentGateway, PaymentGateway};

use super::test_data_builder::{AdminBuilder, MatchRequestBuilder, SpectatorBuilder};

pub struct TestApp {
    _temp_file: NamedTempFile,
    pub state: AppState,
}

impl TestApp {
    /// 支付总是成功
    pub fn new() -> Self {
        Self::with_gateway(Arc::new(FixedPaymentGateway::approving()))
    }

    pub fn with_gateway(payment: Arc<dyn PaymentGateway>) -> Self {
        logging::init_test();
        let temp_file = NamedTempFile::new().expect("创建临时数据库失败");
        let db_path = temp_file.path().to_string_lossy().to_string();
        let state = AppState::with_payment_gateway(db_path, payment).expect("初始化AppState失败");
        Self {
            _temp_file: temp_file,
            state,
        }
    }

    pub fn spectator(&self, email: &str) -> User {
        self.state
            .user_api
            .register_spectator(SpectatorBuilder::new(email).request(), Some("MA".to_string()), None)
            .expect("注册观众失败")
    }

    pub fn admin(&self, email: &str, can_view_alerts: bool) -> User {
        let builder = AdminBuilder::new(email).can_view_alerts(can_view_alerts);
        self.state
            .user_api
            .register_administrator(builder.request(), builder.profile())
            .expect("注册管理员失败")
    }

    /// 30 天后开赛的比赛
    pub fn upcoming_match(&self, capacity: i64) -> Match {
        self.schedule(MatchRequestBuilder::new().capacity(capacity))
    }

    /// 开赛时间相对当前偏移（负数表示已开赛）
    pub fn match_kicking_off_in(&self, capacity: i64, offset: Duration) -> Match {
        self.schedule(
            MatchRequestBuilder::new()
                .capacity(capacity)
                .kickoff_at(now() + offset),
        )
    }

    pub fn schedule(&self, builder: MatchRequestBuilder) -> Match {
        self.state
            .match_api
            .schedule_match(builder.build())
            .expect("排期失败")
    }

    pub fn zone(&self, match_id: &str, zone_type: ZoneType) -> Zone {
        self.state
            .match_api
            .zones_of_match(match_id)
            .expect("读取区域失败")
            .into_iter()
            .find(|z| z.zone_type == zone_type)
            .expect("区域不存在")
    }

    pub fn reload_zone(&self, match_id: &str, zone_id: &str) -> Zone {
        self.state
            .match_api
            .zones_of_match(match_id)
            .expect("读取区域失败")
            .into_iter()
            .find(|z| z.zone_id == zone_id)
            .expect("区域不存在")
    }

    pub fn reload_match(&self, match_id: &str) -> Match {
        self.state
            .match_api
            .get_match(match_id)
            .expect("读取比赛失败")
            .expect("比赛不存在")
    }
}

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
