// ==========================================
// 世界杯票务系统 - 比赛 API
// ==========================================
// 职责: 比赛排期（默认六个区域 + 初始人流记录）、完赛、删除保护、统计、球队
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::clock_now;
use crate::api::error::{require_non_empty, ApiError, ApiResult};
use crate::domain::fixture::{Match, Team};
use crate::domain::flow::FlowRecord;
use crate::domain::outcome::{Outcome, RejectReason};
use crate::domain::types::{MatchPhase, ZoneType};
use crate::domain::zone::Zone;
use crate::engine::flow_monitor::initial_flow_record;
use crate::engine::zone_inventory::ZoneInventory;
use crate::repository::match_repo::MatchRepository;
use crate::repository::team_repo::TeamRepository;
use crate::repository::ticket_repo::TicketRepository;
use crate::repository::zone_repo::ZoneRepository;

/// 默认区域布局: (类型, 价格系数)，每个区域分得 capacity / 8 个座位
const DEFAULT_ZONE_LAYOUT: [(ZoneType, f64); 6] = [
    (ZoneType::NorthStand, 1.0),
    (ZoneType::SouthStand, 1.0),
    (ZoneType::EastStand, 1.2),
    (ZoneType::WestStand, 1.2),
    (ZoneType::Vip, 3.0),
    (ZoneType::Curve, 0.8),
];

const ZONE_SHARE_DIVISOR: i64 = 8;
const VIP_SHARE_DIVISOR: i64 = 4;

/// 排期请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMatchRequest {
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub kickoff_at: NaiveDateTime,
    pub stadium: String,
    pub city: Option<String>,
    pub phase: MatchPhase,
    pub group_name: Option<String>,
    pub base_price: Option<f64>,
    pub capacity: i64,
}

/// 比赛统计
#[derive(Debug, Clone, Serialize)]
pub struct MatchStats {
    pub match_id: String,
    pub capacity: i64,
    pub tickets_available: i64,
    pub tickets_sold: i64,
    pub revenue: f64,
    pub fill_rate: f64,
    pub zone_occupancy: Vec<(String, f64)>,
}

/// 按布局生成默认区域
pub fn default_zones(match_id: &str, capacity: i64) -> Vec<Zone> {
    let share = capacity / ZONE_SHARE_DIVISOR;
    DEFAULT_ZONE_LAYOUT
        .iter()
        .map(|(zone_type, coefficient)| {
            let seats = match zone_type {
                ZoneType::Vip => share / VIP_SHARE_DIVISOR,
                _ => share,
            };
            Zone {
                zone_id: Uuid::new_v4().to_string(),
                match_id: match_id.to_string(),
                name: zone_type.label().to_string(),
                zone_type: *zone_type,
                capacity: seats,
                available: seats,
                price_coefficient: *coefficient,
                pmr_accessible: false,
                gate: None,
            }
        })
        .collect()
}

fn generate_match_code(phase: MatchPhase) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("{}-{}", phase.code_prefix(), suffix)
}

// ==========================================
// MatchApi - 比赛 API
// ==========================================
pub struct MatchApi {
    match_repo: Arc<MatchRepository>,
    zone_repo: Arc<ZoneRepository>,
    team_repo: Arc<TeamRepository>,
    ticket_repo: Arc<TicketRepository>,
    inventory: Arc<ZoneInventory>,
}

impl MatchApi {
    pub fn new(
        match_repo: Arc<MatchRepository>,
        zone_repo: Arc<ZoneRepository>,
        team_repo: Arc<TeamRepository>,
        ticket_repo: Arc<TicketRepository>,
        inventory: Arc<ZoneInventory>,
    ) -> Self {
        Self {
            match_repo,
            zone_repo,
            team_repo,
            ticket_repo,
            inventory,
        }
    }

    // ==========================================
    // 排期与状态
    // ==========================================

    /// 创建比赛
    ///
    /// 同一事务内写入: 比赛（余票 = 容量）、六个默认区域、每区域一条空白人流记录
    pub fn schedule_match(&self, req: ScheduleMatchRequest) -> ApiResult<Match> {
        require_non_empty(&req.stadium, "球场")?;
        if req.capacity <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "容量必须大于0: {}",
                req.capacity
            )));
        }
        if let Some(price) = req.base_price {
            if price < 0.0 {
                return Err(ApiError::InvalidInput(format!("基准价不能为负: {}", price)));
            }
        }

        let m = Match {
            match_id: Uuid::new_v4().to_string(),
            match_code: generate_match_code(req.phase),
            home_team_id: req.home_team_id,
            away_team_id: req.away_team_id,
            kickoff_at: req.kickoff_at,
            stadium: req.stadium.trim().to_string(),
            city: req.city,
            phase: req.phase,
            group_name: req.group_name,
            base_price: req.base_price,
            capacity: req.capacity,
            tickets_available: req.capacity,
            completed: false,
            home_score: None,
            away_score: None,
        };

        let now = clock_now();
        let zones = default_zones(&m.match_id, m.capacity);
        let flows: Vec<FlowRecord> = zones
            .iter()
            .map(|zone| initial_flow_record(zone, now))
            .collect();

        self.match_repo.insert_scheduled(&m, &zones, &flows)?;
        tracing::info!(
            match_id = %m.match_id,
            match_code = %m.match_code,
            capacity = m.capacity,
            zones = zones.len(),
            "比赛已排期"
        );
        Ok(m)
    }

    /// 登记比分并标记完赛
    pub fn complete_match(
        &self,
        match_id: &str,
        home_score: i32,
        away_score: i32,
    ) -> ApiResult<Outcome<Match>> {
        require_non_empty(match_id, "比赛ID")?;
        if home_score < 0 || away_score < 0 {
            return Err(ApiError::InvalidInput("比分不能为负".to_string()));
        }

        if !self.match_repo.mark_completed(match_id, home_score, away_score)? {
            return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                match_id: match_id.to_string(),
            }));
        }
        tracing::info!(match_id, home_score, away_score, "比赛已完赛");

        match self.match_repo.find_by_id(match_id)? {
            Some(m) => Ok(Outcome::Accepted(m)),
            None => Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                match_id: match_id.to_string(),
            })),
        }
    }

    /// 删除比赛（已有门票时拒绝）
    pub fn delete_match(&self, match_id: &str) -> ApiResult<Outcome<()>> {
        require_non_empty(match_id, "比赛ID")?;

        let count = self.ticket_repo.count_by_match(match_id)?;
        if count > 0 {
            tracing::warn!(match_id, tickets = count, "比赛已有门票，拒绝删除");
            return Ok(Outcome::Rejected(RejectReason::MatchHasTickets { count }));
        }

        if self.match_repo.delete(match_id)? {
            tracing::info!(match_id, "比赛已删除");
            Ok(Outcome::Accepted(()))
        } else {
            Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                match_id: match_id.to_string(),
            }))
        }
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_match(&self, match_id: &str) -> ApiResult<Option<Match>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.match_repo.find_by_id(match_id)?)
    }

    pub fn list_matches(&self) -> ApiResult<Vec<Match>> {
        Ok(self.match_repo.list_all()?)
    }

    pub fn list_upcoming(&self) -> ApiResult<Vec<Match>> {
        Ok(self.match_repo.list_upcoming(clock_now())?)
    }

    pub fn zones_of_match(&self, match_id: &str) -> ApiResult<Vec<Zone>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.zone_repo.list_by_match(match_id)?)
    }

    /// 调整区域价格系数
    pub fn set_zone_price_coefficient(&self, zone_id: &str, coefficient: f64) -> ApiResult<bool> {
        require_non_empty(zone_id, "区域ID")?;
        if coefficient <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "价格系数必须大于0: {}",
                coefficient
            )));
        }
        Ok(self.zone_repo.update_price_coefficient(zone_id, coefficient)?)
    }

    pub fn match_stats(&self, match_id: &str) -> ApiResult<MatchStats> {
        require_non_empty(match_id, "比赛ID")?;
        let m = self
            .match_repo
            .find_by_id(match_id)?
            .ok_or_else(|| ApiError::NotFound(format!("比赛(id={})不存在", match_id)))?;

        Ok(MatchStats {
            match_id: m.match_id.clone(),
            capacity: m.capacity,
            tickets_available: m.tickets_available,
            tickets_sold: self.ticket_repo.count_sold(match_id)?,
            revenue: self.ticket_repo.revenue(match_id)?,
            fill_rate: m.fill_rate(),
            zone_occupancy: self.inventory.match_occupancy(match_id)?,
        })
    }

    // ==========================================
    // 球队
    // ==========================================

    pub fn add_team(&self, team: &Team) -> ApiResult<()> {
        require_non_empty(&team.team_id, "球队ID")?;
        require_non_empty(&team.name, "球队名称")?;
        self.team_repo.insert(team)?;
        Ok(())
    }

    pub fn get_team(&self, team_id: &str) -> ApiResult<Option<Team>> {
        require_non_empty(team_id, "球队ID")?;
        Ok(self.team_repo.find_by_id(team_id)?)
    }

    pub fn list_teams(&self, group_name: Option<&str>) -> ApiResult<Vec<Team>> {
        Ok(self.team_repo.list(group_name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_zone_layout() {
        let zones = default_zones("m1", 8000);
        assert_eq!(zones.len(), 6);

        let vip = zones.iter().find(|z| z.zone_type == ZoneType::Vip).unwrap();
        assert_eq!(vip.capacity, 250);
        assert_eq!(vip.price_coefficient, 3.0);

        let north = zones
            .iter()
            .find(|z| z.zone_type == ZoneType::NorthStand)
            .unwrap();
        assert_eq!(north.capacity, 1000);
        assert_eq!(north.available, 1000);

        let total: i64 = zones.iter().map(|z| z.capacity).sum();
        assert!(total <= 8000);
    }

    #[test]
    fn test_match_code_prefix() {
        let code = generate_match_code(MatchPhase::QuarterFinal);
        assert!(code.starts_with("QF-"));
        assert_eq!(code.len(), "QF-".len() + 6);
    }
}
