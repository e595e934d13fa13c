// ==========================================
// 世界杯票务系统 - 门票仓储
// ==========================================
// 红线: 多行变更（购票/转让/退票）在同一 SQLite 事务中完成
// 红线: 状态迁移使用条件 UPDATE (... WHERE status = 'VALID')
// ==========================================

use crate::db::{parse_db_enum, parse_opt_db_ts, to_db_ts};
use crate::domain::ticket::Ticket;
use crate::domain::transaction::Transaction;
use crate::domain::types::{TicketCategory, TicketStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::inventory_repo::{
    increment_match, increment_zone, try_decrement_match, try_decrement_zone,
};
use crate::repository::transaction_repo::{insert_transaction, mark_purchase_refunded};
use crate::repository::user_repo::increment_tickets_purchased;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TICKET_COLUMNS: &str = r#"
    ticket_id, ticket_number, qr_code, match_id, owner_id, zone_id, seat_label,
    category, status, price, transferable, transfer_count,
    purchased_at, validated_at, used_at, expires_at
"#;

fn map_ticket_row(row: &Row) -> rusqlite::Result<Ticket> {
    Ok(Ticket {
        ticket_id: row.get(0)?,
        ticket_number: row.get(1)?,
        qr_code: row.get(2)?,
        match_id: row.get(3)?,
        owner_id: row.get(4)?,
        zone_id: row.get(5)?,
        seat_label: row.get(6)?,
        category: parse_db_enum(7, &row.get::<_, String>(7)?, TicketCategory::from_db_str)?,
        status: parse_db_enum(8, &row.get::<_, String>(8)?, TicketStatus::from_db_str)?,
        price: row.get(9)?,
        transferable: row.get::<_, i64>(10)? != 0,
        transfer_count: row.get(11)?,
        purchased_at: parse_opt_db_ts(12, row.get(12)?)?,
        validated_at: parse_opt_db_ts(13, row.get(13)?)?,
        used_at: parse_opt_db_ts(14, row.get(14)?)?,
        expires_at: parse_opt_db_ts(15, row.get(15)?)?,
    })
}

fn insert_ticket(conn: &Connection, t: &Ticket) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO ticket (
            ticket_id, ticket_number, qr_code, match_id, owner_id, zone_id, seat_label,
            category, status, price, transferable, transfer_count,
            purchased_at, validated_at, used_at, expires_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
        params![
            t.ticket_id,
            t.ticket_number,
            t.qr_code,
            t.match_id,
            t.owner_id,
            t.zone_id,
            t.seat_label,
            t.category.to_db_str(),
            t.status.to_db_str(),
            t.price,
            t.transferable as i64,
            t.transfer_count,
            t.purchased_at.as_ref().map(to_db_ts),
            t.validated_at.as_ref().map(to_db_ts),
            t.used_at.as_ref().map(to_db_ts),
            t.expires_at.as_ref().map(to_db_ts),
        ],
    )?;
    Ok(())
}

fn find_ticket(conn: &Connection, ticket_id: &str) -> rusqlite::Result<Option<Ticket>> {
    let sql = format!("SELECT {} FROM ticket WHERE ticket_id = ?1", TICKET_COLUMNS);
    conn.query_row(&sql, params![ticket_id], map_ticket_row).optional()
}

// ==========================================
// 事务提交结果
// ==========================================

/// 购票提交结果（计数扣减失败时整个事务回滚）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseCommit {
    Committed,
    MatchSoldOut,
    ZoneSoldOut,
}

/// 转让参数
pub struct TransferCommand<'a> {
    pub ticket_id: &'a str,
    pub new_owner_id: &'a str,
    pub new_qr_code: &'a str,
    pub max_transfers: i32,
}

// ==========================================
// TicketRepository - 门票仓储
// ==========================================
pub struct TicketRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TicketRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_by_id(&self, ticket_id: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        Ok(find_ticket(&conn, ticket_id)?)
    }

    /// 按二维码查找（转让后旧码不再命中）
    pub fn find_by_qr(&self, qr_code: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ticket WHERE qr_code = ?1", TICKET_COLUMNS);
        Ok(conn.query_row(&sql, params![qr_code], map_ticket_row).optional()?)
    }

    pub fn find_by_number(&self, ticket_number: &str) -> RepositoryResult<Option<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ticket WHERE ticket_number = ?1", TICKET_COLUMNS);
        Ok(conn
            .query_row(&sql, params![ticket_number], map_ticket_row)
            .optional()?)
    }

    pub fn list_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Ticket>> {
        self.query_list(
            "WHERE owner_id = ?1 ORDER BY purchased_at DESC, rowid DESC",
            owner_id,
        )
    }

    pub fn list_by_match(&self, match_id: &str) -> RepositoryResult<Vec<Ticket>> {
        self.query_list("WHERE match_id = ?1 ORDER BY rowid", match_id)
    }

    /// 观众名下仍可转让的门票（不含比赛时间判断）
    pub fn list_transferable_by_owner(
        &self,
        owner_id: &str,
        max_transfers: i32,
    ) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM ticket
            WHERE owner_id = ?1 AND status = 'VALID' AND transferable = 1 AND transfer_count < ?2
            ORDER BY rowid
            "#,
            TICKET_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(params![owner_id, max_transfers], map_ticket_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tickets)
    }

    fn query_list(&self, tail: &str, arg: &str) -> RepositoryResult<Vec<Ticket>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM ticket {}", TICKET_COLUMNS, tail);
        let mut stmt = conn.prepare(&sql)?;
        let tickets = stmt
            .query_map(params![arg], map_ticket_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tickets)
    }

    /// 引用该比赛的门票总数（任意状态）
    pub fn count_by_match(&self, match_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM ticket WHERE match_id = ?1",
            params![match_id],
            |row| row.get(0),
        )?)
    }

    /// 已售出数量（VALID + USED）
    pub fn count_sold(&self, match_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM ticket WHERE match_id = ?1 AND status IN ('VALID', 'USED')",
            params![match_id],
            |row| row.get(0),
        )?)
    }

    /// 比赛票房（VALID + USED 票价合计）
    pub fn revenue(&self, match_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            r#"
            SELECT COALESCE(SUM(price), 0.0) FROM ticket
            WHERE match_id = ?1 AND status IN ('VALID', 'USED')
            "#,
            params![match_id],
            |row| row.get(0),
        )?)
    }

    // ==========================================
    // 事务操作
    // ==========================================

    /// 提交一张已支付门票
    ///
    /// 单一事务内:
    /// 1. 比赛余票条件 -1
    /// 2. 区域座位条件 -1（有区域时）
    /// 3. 写入门票 + 购票流水
    /// 4. 观众购票计数 +1
    ///
    /// 任一扣减失败即回滚并返回对应的售罄结果
    pub fn commit_purchase(
        &self,
        ticket: &Ticket,
        purchase: &Transaction,
    ) -> RepositoryResult<PurchaseCommit> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if !try_decrement_match(&tx, &ticket.match_id)? {
            return Ok(PurchaseCommit::MatchSoldOut);
        }
        if let Some(zone_id) = ticket.zone_id.as_deref() {
            if !try_decrement_zone(&tx, zone_id)? {
                return Ok(PurchaseCommit::ZoneSoldOut);
            }
        }

        insert_ticket(&tx, ticket)?;
        insert_transaction(&tx, purchase)?;
        if let Some(owner_id) = ticket.owner_id.as_deref() {
            increment_tickets_purchased(&tx, owner_id)?;
        }

        tx.commit()?;
        Ok(PurchaseCommit::Committed)
    }

    /// 转让: VALID → IN_TRANSFER → VALID（新持有人、新二维码、次数 +1）
    ///
    /// 返回 None 表示门票已不满足转让条件（并发下被其他操作抢先）
    pub fn commit_transfer(
        &self,
        cmd: &TransferCommand<'_>,
        record: &Transaction,
    ) -> RepositoryResult<Option<Ticket>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let locked = tx.execute(
            r#"
            UPDATE ticket SET status = 'IN_TRANSFER'
            WHERE ticket_id = ?1 AND status = 'VALID' AND transferable = 1 AND transfer_count < ?2
            "#,
            params![cmd.ticket_id, cmd.max_transfers],
        )?;
        if locked != 1 {
            return Ok(None);
        }

        tx.execute(
            r#"
            UPDATE ticket
            SET owner_id = ?1, qr_code = ?2, transfer_count = transfer_count + 1, status = 'VALID'
            WHERE ticket_id = ?3 AND status = 'IN_TRANSFER'
            "#,
            params![cmd.new_owner_id, cmd.new_qr_code, cmd.ticket_id],
        )?;
        insert_transaction(&tx, record)?;

        let updated = find_ticket(&tx, cmd.ticket_id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// 闸机核验: VALID → USED
    pub fn mark_used(&self, ticket_id: &str, now: NaiveDateTime) -> RepositoryResult<Option<Ticket>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let ts = to_db_ts(&now);
        let n = tx.execute(
            r#"
            UPDATE ticket SET status = 'USED', validated_at = ?1, used_at = ?1
            WHERE ticket_id = ?2 AND status = 'VALID'
            "#,
            params![ts, ticket_id],
        )?;
        if n != 1 {
            return Ok(None);
        }
        let updated = find_ticket(&tx, ticket_id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// 退票: VALID → CANCELLED，写退款流水，购票流水标记 REFUNDED，释放座位
    ///
    /// 座位释放在容量处截断
    pub fn commit_cancellation(
        &self,
        ticket_id: &str,
        refund: &Transaction,
    ) -> RepositoryResult<Option<Ticket>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let n = tx.execute(
            "UPDATE ticket SET status = 'CANCELLED' WHERE ticket_id = ?1 AND status = 'VALID'",
            params![ticket_id],
        )?;
        if n != 1 {
            return Ok(None);
        }

        let ticket = match find_ticket(&tx, ticket_id)? {
            Some(t) => t,
            None => return Ok(None),
        };

        insert_transaction(&tx, refund)?;
        mark_purchase_refunded(&tx, ticket_id)?;
        if let Some(zone_id) = ticket.zone_id.as_deref() {
            increment_zone(&tx, zone_id)?;
        }
        increment_match(&tx, &ticket.match_id)?;

        tx.commit()?;
        Ok(Some(ticket))
    }

    /// 过期扫描: 到期的非终态门票 → EXPIRED，返回影响数量
    pub fn expire_overdue(&self, now: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            r#"
            UPDATE ticket SET status = 'EXPIRED'
            WHERE expires_at IS NOT NULL AND expires_at <= ?1
              AND status IN ('RESERVED', 'VALID', 'IN_TRANSFER')
            "#,
            params![to_db_ts(&now)],
        )?;
        Ok(n)
    }
}
