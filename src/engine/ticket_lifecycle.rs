// ==========================================
// 世界杯票务系统 - 门票生命周期引擎
// ==========================================
// 状态机: RESERVED → VALID → USED
//         VALID → CANCELLED
//         VALID → IN_TRANSFER → VALID
// 红线: 每个购票单位都重新读取比赛/区域/观众，不缓存计数
// 红线: 业务拒绝以 Outcome::Rejected 返回，只有持久化故障走 Err
// ==========================================

use crate::config::policy::TicketingPolicy;
use crate::domain::outcome::{Outcome, PurchaseReport, RefundReceipt, RejectReason, TransferReceipt};
use crate::domain::ticket::{generate_qr_token, Ticket};
use crate::domain::transaction::Transaction;
use crate::domain::types::{TicketCategory, TicketStatus, TransactionStatus, TransactionType};
use crate::domain::zone::Zone;
use crate::engine::payment::PaymentGateway;
use crate::engine::pricing::PricingCalculator;
use crate::perf::PerfGuard;
use crate::repository::error::RepositoryResult;
use crate::repository::match_repo::MatchRepository;
use crate::repository::ticket_repo::{PurchaseCommit, TicketRepository, TransferCommand};
use crate::repository::transaction_repo::TransactionRepository;
use crate::repository::user_repo::UserRepository;
use crate::repository::zone_repo::ZoneRepository;
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tracing::instrument;

/// 门票在开赛后的有效时长（小时），超过后由过期扫描置为 EXPIRED
pub const TICKET_VALIDITY_AFTER_KICKOFF_HOURS: i64 = 24;

pub struct TicketLifecycleManager {
    match_repo: Arc<MatchRepository>,
    zone_repo: Arc<ZoneRepository>,
    user_repo: Arc<UserRepository>,
    ticket_repo: Arc<TicketRepository>,
    transaction_repo: Arc<TransactionRepository>,
    payment: Arc<dyn PaymentGateway>,
    pricing: PricingCalculator,
    policy: TicketingPolicy,
}

impl TicketLifecycleManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        match_repo: Arc<MatchRepository>,
        zone_repo: Arc<ZoneRepository>,
        user_repo: Arc<UserRepository>,
        ticket_repo: Arc<TicketRepository>,
        transaction_repo: Arc<TransactionRepository>,
        payment: Arc<dyn PaymentGateway>,
        policy: TicketingPolicy,
    ) -> Self {
        Self {
            match_repo,
            zone_repo,
            user_repo,
            ticket_repo,
            transaction_repo,
            payment,
            pricing: PricingCalculator::with_default_base_price(policy.default_base_price),
            policy,
        }
    }

    pub fn pricing(&self) -> &PricingCalculator {
        &self.pricing
    }

    pub fn policy(&self) -> &TicketingPolicy {
        &self.policy
    }

    // ==========================================
    // 购票
    // ==========================================

    /// 逐张购票
    ///
    /// - 售罄（比赛或区域）即停止，不做部分重试
    /// - 支付被拒: 记录 REFUSED 流水，继续下一张
    #[instrument(skip(self), fields(requested = quantity))]
    pub fn purchase(
        &self,
        spectator_id: &str,
        match_id: &str,
        zone_id: Option<&str>,
        category: TicketCategory,
        quantity: u32,
        now: NaiveDateTime,
    ) -> RepositoryResult<PurchaseReport> {
        let _perf = PerfGuard::new("purchase_tickets");
        let mut report = PurchaseReport::new(quantity);

        if quantity == 0 {
            report.rejections.push(RejectReason::InvalidQuantity { quantity });
            return Ok(report);
        }

        for unit in 0..quantity {
            match self.purchase_one(spectator_id, match_id, zone_id, category, now)? {
                Outcome::Accepted(ticket) => {
                    tracing::debug!(unit, ticket_id = %ticket.ticket_id, price = ticket.price, "购票成功");
                    report.tickets.push(ticket);
                }
                Outcome::Rejected(reason @ RejectReason::PaymentRefused { .. }) => {
                    tracing::warn!(unit, reason = %reason, "支付被拒绝");
                    report.rejections.push(reason);
                }
                Outcome::Rejected(reason) => {
                    tracing::warn!(unit, code = reason.code(), reason = %reason, "购票中止");
                    report.rejections.push(reason);
                    break;
                }
            }
        }

        tracing::info!(
            spectator_id,
            match_id,
            requested = quantity,
            purchased = report.purchased_count(),
            "购票完成"
        );
        Ok(report)
    }

    fn purchase_one(
        &self,
        spectator_id: &str,
        match_id: &str,
        zone_id: Option<&str>,
        category: TicketCategory,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<Ticket>> {
        // 每个单位重新读取，避免陈旧计数导致超卖
        let m = match self.match_repo.find_by_id(match_id)? {
            Some(m) => m,
            None => {
                return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                    match_id: match_id.to_string(),
                }))
            }
        };
        if m.completed {
            return Ok(Outcome::Rejected(RejectReason::EventOver));
        }
        if m.is_sold_out() {
            return Ok(Outcome::Rejected(RejectReason::MatchSoldOut));
        }

        let spectator = match self.user_repo.find_by_id(spectator_id)? {
            Some(u) => u,
            None => {
                return Ok(Outcome::Rejected(RejectReason::SpectatorNotFound {
                    user_id: spectator_id.to_string(),
                }))
            }
        };
        if spectator.as_spectator().is_none() {
            return Ok(Outcome::Rejected(RejectReason::NotSpectator {
                user_id: spectator_id.to_string(),
            }));
        }

        let zone: Option<Zone> = match zone_id {
            Some(zid) => match self.zone_repo.find_by_id(zid)? {
                None => {
                    return Ok(Outcome::Rejected(RejectReason::ZoneNotFound {
                        zone_id: zid.to_string(),
                    }))
                }
                Some(z) if z.match_id != m.match_id => {
                    return Ok(Outcome::Rejected(RejectReason::ZoneNotInMatch {
                        zone_id: zid.to_string(),
                        match_id: m.match_id.clone(),
                    }))
                }
                Some(z) if z.available <= 0 => {
                    return Ok(Outcome::Rejected(RejectReason::ZoneSoldOut {
                        zone_id: zid.to_string(),
                    }))
                }
                Some(z) => Some(z),
            },
            None => None,
        };

        let price = self.pricing.price_for(&m, zone.as_ref(), category);
        let mut ticket = Ticket::reserve(
            &m.match_id,
            &spectator.user_id,
            zone.as_ref().map(|z| z.zone_id.as_str()),
            category,
            price,
        );

        let mut purchase = Transaction::pending(
            TransactionType::Purchase,
            Some(&spectator.user_id),
            Some(&ticket.ticket_id),
            price,
            now,
        );
        purchase.payment_method = Some(self.policy.payment_method.clone());
        purchase.currency = self.policy.currency.clone();

        if !self
            .payment
            .process_payment(&spectator.user_id, price, &purchase.reference)
        {
            // 门票不落库，流水不挂门票
            purchase.refuse();
            purchase.ticket_id = None;
            self.transaction_repo.insert(&purchase)?;
            return Ok(Outcome::Rejected(RejectReason::PaymentRefused {
                reference: purchase.reference,
            }));
        }

        ticket.status = TicketStatus::Valid;
        ticket.purchased_at = Some(now);
        ticket.expires_at = Some(m.kickoff_at + Duration::hours(TICKET_VALIDITY_AFTER_KICKOFF_HOURS));
        purchase.validate(now);

        match self.ticket_repo.commit_purchase(&ticket, &purchase)? {
            PurchaseCommit::Committed => Ok(Outcome::Accepted(ticket)),
            PurchaseCommit::MatchSoldOut => {
                tracing::warn!(reference = %purchase.reference, "支付成功但比赛余票已被抢占，原路退款");
                self.compensate(purchase, now)?;
                Ok(Outcome::Rejected(RejectReason::MatchSoldOut))
            }
            PurchaseCommit::ZoneSoldOut => {
                tracing::warn!(reference = %purchase.reference, "支付成功但区域座位已被抢占，原路退款");
                self.compensate(purchase, now)?;
                Ok(Outcome::Rejected(RejectReason::ZoneSoldOut {
                    zone_id: zone.map(|z| z.zone_id).unwrap_or_default(),
                }))
            }
        }
    }

    /// 出票失败的冲正: 扣款流水记为 REFUNDED，另记一笔等额 REFUND（均不挂门票）
    fn compensate(&self, mut purchase: Transaction, now: NaiveDateTime) -> RepositoryResult<()> {
        purchase.ticket_id = None;
        purchase.status = TransactionStatus::Refunded;

        let mut refund = Transaction::pending(
            TransactionType::Refund,
            purchase.user_id.as_deref(),
            None,
            purchase.amount,
            now,
        );
        refund.currency = purchase.currency.clone();
        refund.payment_method = purchase.payment_method.clone();
        refund.validate(now);

        self.transaction_repo.insert_compensated(&purchase, &refund)
    }

    // ==========================================
    // 转让
    // ==========================================

    /// 转让给指定邮箱的观众
    ///
    /// 条件: VALID + 可转让 + 次数未达上限 + 比赛未开始
    #[instrument(skip(self))]
    pub fn transfer(
        &self,
        ticket_id: &str,
        new_owner_email: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<TransferReceipt>> {
        let ticket = match self.ticket_repo.find_by_id(ticket_id)? {
            Some(t) => t,
            None => {
                return Ok(Outcome::Rejected(RejectReason::TicketNotFound {
                    ticket_id: ticket_id.to_string(),
                }))
            }
        };

        let recipient = match self.user_repo.find_by_email(new_owner_email)? {
            Some(u) => u,
            None => {
                return Ok(Outcome::Rejected(RejectReason::RecipientNotFound {
                    email: new_owner_email.to_string(),
                }))
            }
        };
        if recipient.as_spectator().is_none() {
            return Ok(Outcome::Rejected(RejectReason::NotSpectator {
                user_id: recipient.user_id,
            }));
        }

        if let Some(reason) = self.transfer_block_reason(&ticket) {
            return Ok(Outcome::Rejected(reason));
        }

        match self.match_repo.find_by_id(&ticket.match_id)? {
            Some(m) if m.is_upcoming(now) => {}
            Some(_) => return Ok(Outcome::Rejected(RejectReason::MatchNotUpcoming)),
            None => {
                return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                    match_id: ticket.match_id.clone(),
                }))
            }
        }

        if ticket.owner_id.as_deref() == Some(recipient.user_id.as_str()) {
            return Ok(Outcome::Rejected(RejectReason::SameOwner));
        }

        let mut record = Transaction::pending(
            TransactionType::Transfer,
            Some(&recipient.user_id),
            Some(&ticket.ticket_id),
            0.0,
            now,
        );
        record.currency = self.policy.currency.clone();
        record.source_user_id = ticket.owner_id.clone();
        record.destination_user_id = Some(recipient.user_id.clone());
        record.validate(now);

        let new_qr = generate_qr_token();
        let cmd = TransferCommand {
            ticket_id: &ticket.ticket_id,
            new_owner_id: &recipient.user_id,
            new_qr_code: &new_qr,
            max_transfers: self.policy.max_transfers,
        };

        match self.ticket_repo.commit_transfer(&cmd, &record)? {
            Some(updated) => {
                tracing::info!(
                    ticket_id,
                    from = ?ticket.owner_id,
                    to = %recipient.user_id,
                    transfer_count = updated.transfer_count,
                    "门票已转让"
                );
                Ok(Outcome::Accepted(TransferReceipt {
                    ticket: updated,
                    previous_owner_id: ticket.owner_id,
                    new_owner_id: recipient.user_id,
                    transaction: record,
                }))
            }
            None => Ok(Outcome::Rejected(self.current_state_reason(ticket_id)?)),
        }
    }

    fn transfer_block_reason(&self, ticket: &Ticket) -> Option<RejectReason> {
        if ticket.status != TicketStatus::Valid {
            return Some(RejectReason::TicketNotValid {
                status: ticket.status,
            });
        }
        if !ticket.transferable {
            return Some(RejectReason::NotTransferable);
        }
        if ticket.transfer_count >= self.policy.max_transfers {
            return Some(RejectReason::TransferLimitReached {
                limit: self.policy.max_transfers,
            });
        }
        None
    }

    // ==========================================
    // 闸机核验
    // ==========================================

    /// 按二维码核验入场: VALID → USED
    #[instrument(skip(self, qr_code))]
    pub fn validate_at_gate(
        &self,
        qr_code: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<Ticket>> {
        let ticket = match self.ticket_repo.find_by_qr(qr_code)? {
            Some(t) => t,
            None => return Ok(Outcome::Rejected(RejectReason::UnknownQrCode)),
        };

        match ticket.status {
            TicketStatus::Valid => {}
            TicketStatus::Used => return Ok(Outcome::Rejected(RejectReason::TicketAlreadyUsed)),
            TicketStatus::Expired => return Ok(Outcome::Rejected(RejectReason::TicketExpired)),
            status => return Ok(Outcome::Rejected(RejectReason::TicketNotValid { status })),
        }
        if ticket.is_expired_at(now) {
            return Ok(Outcome::Rejected(RejectReason::TicketExpired));
        }

        match self.match_repo.find_by_id(&ticket.match_id)? {
            Some(m) if m.completed => return Ok(Outcome::Rejected(RejectReason::EventOver)),
            Some(_) => {}
            None => {
                return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                    match_id: ticket.match_id.clone(),
                }))
            }
        }

        match self.ticket_repo.mark_used(&ticket.ticket_id, now)? {
            Some(used) => {
                tracing::info!(ticket_id = %used.ticket_id, match_id = %used.match_id, "闸机核验通过");
                Ok(Outcome::Accepted(used))
            }
            None => Ok(Outcome::Rejected(self.current_state_reason(&ticket.ticket_id)?)),
        }
    }

    // ==========================================
    // 退票
    // ==========================================

    /// 退票: VALID + 比赛未开始 → CANCELLED，全额退款，释放座位
    #[instrument(skip(self))]
    pub fn cancel(
        &self,
        ticket_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Outcome<RefundReceipt>> {
        let ticket = match self.ticket_repo.find_by_id(ticket_id)? {
            Some(t) => t,
            None => {
                return Ok(Outcome::Rejected(RejectReason::TicketNotFound {
                    ticket_id: ticket_id.to_string(),
                }))
            }
        };

        if let Some(purchase) = self.transaction_repo.find_purchase_for_ticket(ticket_id)? {
            if purchase.status == TransactionStatus::Refunded {
                return Ok(Outcome::Rejected(RejectReason::AlreadyRefunded));
            }
        }
        if ticket.status != TicketStatus::Valid {
            return Ok(Outcome::Rejected(RejectReason::TicketNotValid {
                status: ticket.status,
            }));
        }

        match self.match_repo.find_by_id(&ticket.match_id)? {
            Some(m) if m.is_upcoming(now) => {}
            Some(_) => return Ok(Outcome::Rejected(RejectReason::MatchNotUpcoming)),
            None => {
                return Ok(Outcome::Rejected(RejectReason::MatchNotFound {
                    match_id: ticket.match_id.clone(),
                }))
            }
        }

        let mut refund = Transaction::pending(
            TransactionType::Refund,
            ticket.owner_id.as_deref(),
            Some(&ticket.ticket_id),
            ticket.price,
            now,
        );
        refund.currency = self.policy.currency.clone();
        refund.payment_method = Some(self.policy.payment_method.clone());
        refund.validate(now);

        match self.ticket_repo.commit_cancellation(ticket_id, &refund)? {
            Some(cancelled) => {
                tracing::info!(ticket_id, amount = refund.amount, "退票完成");
                Ok(Outcome::Accepted(RefundReceipt {
                    ticket: cancelled,
                    refund,
                }))
            }
            None => Ok(Outcome::Rejected(self.current_state_reason(ticket_id)?)),
        }
    }

    // ==========================================
    // 过期扫描
    // ==========================================

    pub fn expire_overdue(&self, now: NaiveDateTime) -> RepositoryResult<usize> {
        let n = self.ticket_repo.expire_overdue(now)?;
        if n > 0 {
            tracing::info!(expired = n, "过期门票已处理");
        }
        Ok(n)
    }

    /// 条件更新未命中时，按门票当前状态给出拒绝原因
    fn current_state_reason(&self, ticket_id: &str) -> RepositoryResult<RejectReason> {
        Ok(match self.ticket_repo.find_by_id(ticket_id)? {
            None => RejectReason::TicketNotFound {
                ticket_id: ticket_id.to_string(),
            },
            Some(t) if t.status == TicketStatus::Used => RejectReason::TicketAlreadyUsed,
            Some(t) if t.status == TicketStatus::Expired => RejectReason::TicketExpired,
            Some(t) => self
                .transfer_block_reason(&t)
                .unwrap_or(RejectReason::TicketNotValid { status: t.status }),
        })
    }
}
