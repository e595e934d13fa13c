// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::{Duration, NaiveDateTime};

use worldcup_ticketing::api::{RegisterUserRequest, ScheduleMatchRequest};
use worldcup_ticketing::domain::{AdminProfile, MatchPhase};

// ==========================================
// 比赛排期请求构建器
// ==========================================

pub struct MatchRequestBuilder {
    kickoff_at: NaiveDateTime,
    stadium: String,
    phase: MatchPhase,
    base_price: Option<f64>,
    capacity: i64,
}

impl MatchRequestBuilder {
    pub fn new() -> Self {
        Self {
            kickoff_at: chrono::Local::now().naive_local() + Duration::days(30),
            stadium: "Grand Stade Hassan II".to_string(),
            phase: MatchPhase::GroupStage,
            base_price: Some(100.0),
            capacity: 800,
        }
    }

    pub fn kickoff_at(mut self, kickoff_at: NaiveDateTime) -> Self {
        self.kickoff_at = kickoff_at;
        self
    }

    pub fn phase(mut self, phase: MatchPhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn base_price(mut self, base_price: Option<f64>) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn capacity(mut self, capacity: i64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn build(self) -> ScheduleMatchRequest {
        ScheduleMatchRequest {
            home_team_id: None,
            away_team_id: None,
            kickoff_at: self.kickoff_at,
            stadium: self.stadium,
            city: Some("Casablanca".to_string()),
            phase: self.phase,
            group_name: Some("A".to_string()),
            base_price: self.base_price,
            capacity: self.capacity,
        }
    }
}

// ==========================================
// 用户构建器
// ==========================================

pub struct SpectatorBuilder {
    email: String,
}

impl SpectatorBuilder {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
        }
    }

    pub fn request(&self) -> RegisterUserRequest {
        RegisterUserRequest {
            email: self.email.clone(),
            last_name: "Benali".to_string(),
            first_name: "Yasmine".to_string(),
        }
    }
}

pub struct AdminBuilder {
    email: String,
    can_view_alerts: bool,
}

impl AdminBuilder {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            can_view_alerts: true,
        }
    }

    pub fn can_view_alerts(mut self, allowed: bool) -> Self {
        self.can_view_alerts = allowed;
        self
    }

    pub fn request(&self) -> RegisterUserRequest {
        RegisterUserRequest {
            email: self.email.clone(),
            last_name: "Alaoui".to_string(),
            first_name: "Karim".to_string(),
        }
    }

    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            access_level: 2,
            department: Some("Sécurité".to_string()),
            can_manage_users: false,
            can_manage_matches: true,
            can_view_alerts: self.can_view_alerts,
        }
    }
}
