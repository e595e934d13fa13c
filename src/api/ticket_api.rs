// ==========================================
// 世界杯票务系统 - 门票 API
// ==========================================
// 职责: 购票、转让、闸机核验、退票、门票查询、定价
// 说明: 业务拒绝以 Outcome 返回，ApiError 只表示输入或持久化故障
// ==========================================

use std::sync::Arc;

use crate::api::error::{require_non_empty, ApiResult};
use crate::api::clock_now;
use crate::domain::outcome::{Outcome, PurchaseReport, RefundReceipt, RejectReason, TransferReceipt};
use crate::domain::ticket::Ticket;
use crate::domain::transaction::Transaction;
use crate::domain::types::{MatchPhase, TicketCategory};
use crate::engine::ticket_lifecycle::TicketLifecycleManager;
use crate::repository::match_repo::MatchRepository;
use crate::repository::ticket_repo::TicketRepository;
use crate::repository::transaction_repo::TransactionRepository;
use crate::repository::zone_repo::ZoneRepository;

// ==========================================
// TicketApi - 门票 API
// ==========================================

/// 门票API
///
/// 职责：
/// 1. 门票生命周期操作（委托 TicketLifecycleManager）
/// 2. 门票与流水查询
/// 3. 票价计算
pub struct TicketApi {
    lifecycle: Arc<TicketLifecycleManager>,
    match_repo: Arc<MatchRepository>,
    zone_repo: Arc<ZoneRepository>,
    ticket_repo: Arc<TicketRepository>,
    transaction_repo: Arc<TransactionRepository>,
}

impl TicketApi {
    pub fn new(
        lifecycle: Arc<TicketLifecycleManager>,
        match_repo: Arc<MatchRepository>,
        zone_repo: Arc<ZoneRepository>,
        ticket_repo: Arc<TicketRepository>,
        transaction_repo: Arc<TransactionRepository>,
    ) -> Self {
        Self {
            lifecycle,
            match_repo,
            zone_repo,
            ticket_repo,
            transaction_repo,
        }
    }

    // ==========================================
    // 生命周期操作
    // ==========================================

    /// 购票
    ///
    /// # 参数
    /// - spectator_id: 观众ID
    /// - match_id: 比赛ID
    /// - zone_id: 区域ID（None 表示不指定区域，仅占用比赛总库存）
    /// - category: 票类
    /// - quantity: 张数
    ///
    /// # 返回
    /// - Ok(PurchaseReport): 成功门票 + 拒绝原因
    /// - Err(ApiError): 输入错误或持久化故障
    pub fn purchase_tickets(
        &self,
        spectator_id: &str,
        match_id: &str,
        zone_id: Option<&str>,
        category: TicketCategory,
        quantity: u32,
    ) -> ApiResult<PurchaseReport> {
        require_non_empty(spectator_id, "观众ID")?;
        require_non_empty(match_id, "比赛ID")?;
        if let Some(z) = zone_id {
            require_non_empty(z, "区域ID")?;
        }

        Ok(self.lifecycle.purchase(
            spectator_id,
            match_id,
            zone_id,
            category,
            quantity,
            clock_now(),
        )?)
    }

    /// 转让门票给指定邮箱的观众
    pub fn transfer_ticket(
        &self,
        ticket_id: &str,
        new_owner_email: &str,
    ) -> ApiResult<Outcome<TransferReceipt>> {
        require_non_empty(ticket_id, "门票ID")?;
        require_non_empty(new_owner_email, "受让人邮箱")?;
        Ok(self.lifecycle.transfer(ticket_id, new_owner_email, clock_now())?)
    }

    /// 闸机核验
    pub fn validate_at_gate(&self, qr_code: &str) -> ApiResult<Outcome<Ticket>> {
        require_non_empty(qr_code, "二维码")?;
        Ok(self.lifecycle.validate_at_gate(qr_code, clock_now())?)
    }

    /// 退票
    pub fn cancel_ticket(&self, ticket_id: &str) -> ApiResult<Outcome<RefundReceipt>> {
        require_non_empty(ticket_id, "门票ID")?;
        Ok(self.lifecycle.cancel(ticket_id, clock_now())?)
    }

    /// 过期扫描，返回处理张数
    pub fn expire_overdue_tickets(&self) -> ApiResult<usize> {
        Ok(self.lifecycle.expire_overdue(clock_now())?)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_ticket(&self, ticket_id: &str) -> ApiResult<Option<Ticket>> {
        require_non_empty(ticket_id, "门票ID")?;
        Ok(self.ticket_repo.find_by_id(ticket_id)?)
    }

    pub fn ticket_by_number(&self, ticket_number: &str) -> ApiResult<Option<Ticket>> {
        require_non_empty(ticket_number, "票号")?;
        Ok(self.ticket_repo.find_by_number(ticket_number.trim())?)
    }

    pub fn tickets_of_spectator(&self, spectator_id: &str) -> ApiResult<Vec<Ticket>> {
        require_non_empty(spectator_id, "观众ID")?;
        Ok(self.ticket_repo.list_by_owner(spectator_id)?)
    }

    pub fn tickets_of_match(&self, match_id: &str) -> ApiResult<Vec<Ticket>> {
        require_non_empty(match_id, "比赛ID")?;
        Ok(self.ticket_repo.list_by_match(match_id)?)
    }

    /// 观众名下可转让的门票
    pub fn transferable_tickets(&self, spectator_id: &str) -> ApiResult<Vec<Ticket>> {
        require_non_empty(spectator_id, "观众ID")?;
        Ok(self
            .ticket_repo
            .list_transferable_by_owner(spectator_id, self.lifecycle.policy().max_transfers)?)
    }

    /// 门票的购票流水是否仍可退款（已确认且比赛未开始）
    pub fn is_refundable(&self, ticket_id: &str) -> ApiResult<bool> {
        require_non_empty(ticket_id, "门票ID")?;
        let Some(ticket) = self.ticket_repo.find_by_id(ticket_id)? else {
            return Ok(false);
        };
        let Some(purchase) = self.transaction_repo.find_purchase_for_ticket(ticket_id)? else {
            return Ok(false);
        };
        let upcoming = self
            .match_repo
            .find_by_id(&ticket.match_id)?
            .map(|m| m.is_upcoming(clock_now()))
            .unwrap_or(false);
        Ok(purchase.is_refundable(upcoming))
    }

    pub fn transactions_of_ticket(&self, ticket_id: &str) -> ApiResult<Vec<Transaction>> {
        require_non_empty(ticket_id, "门票ID")?;
        Ok(self.transaction_repo.list_by_ticket(ticket_id)?)
    }

    pub fn transactions_of_user(&self, user_id: &str) -> ApiResult<Vec<Transaction>> {
        require_non_empty(user_id, "用户ID")?;
        Ok(self.transaction_repo.list_by_user(user_id)?)
    }

    // ==========================================
    // 定价
    // ==========================================

    /// base × 票类系数 × 阶段系数（base 缺省时使用默认基准价）
    pub fn calculate_price(
        &self,
        base_price: Option<f64>,
        category: TicketCategory,
        phase: MatchPhase,
    ) -> f64 {
        self.lifecycle
            .pricing()
            .calculate_price(base_price, category, phase)
    }

    /// base × 票类系数 × 区域系数 × 阶段系数
    pub fn calculate_zone_price(
        &self,
        base_price: Option<f64>,
        category: TicketCategory,
        zone_coefficient: f64,
        phase: MatchPhase,
    ) -> f64 {
        self.lifecycle
            .pricing()
            .calculate_zone_price(base_price, category, zone_coefficient, phase)
    }

    /// 按比赛/区域报价
    pub fn quote_price(
        &self,
        match_id: &str,
        zone_id: Option<&str>,
        category: TicketCategory,
    ) -> ApiResult<Outcome<f64>> {
        require_non_empty(match_id, "比赛ID")?;

        let m = match self.match_repo.find_by_id(match_id)? {
            Some(m) => m,
            None => {
                return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                    match_id: match_id.to_string(),
                }))
            }
        };

        let zone = match zone_id {
            None => None,
            Some(zid) => match self.zone_repo.find_by_id(zid)? {
                Some(z) if z.match_id == m.match_id => Some(z),
                Some(_) => {
                    return Ok(Outcome::Rejected(RejectReason::ZoneNotInMatch {
                        zone_id: zid.to_string(),
                        match_id: match_id.to_string(),
                    }))
                }
                None => {
                    return Ok(Outcome::Rejected(RejectReason::ZoneNotFound {
                        zone_id: zid.to_string(),
                    }))
                }
            },
        };

        Ok(Outcome::Accepted(self.lifecycle.pricing().price_for(
            &m,
            zone.as_ref(),
            category,
        )))
    }
}
