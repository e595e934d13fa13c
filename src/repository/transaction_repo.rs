// ==========================================
// 世界杯票务系统 - 交易流水仓储
// ==========================================
// 流水只追加；状态变更仅限 VALIDATED → REFUNDED
// ==========================================

use crate::db::{parse_db_enum, parse_db_ts, parse_opt_db_ts, to_db_ts};
use crate::domain::transaction::Transaction;
use crate::domain::types::{TransactionStatus, TransactionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TX_COLUMNS: &str = r#"
    transaction_id, reference, user_id, ticket_id, tx_type, status,
    amount, currency, payment_method, source_user_id, destination_user_id,
    created_at, validated_at
"#;

fn map_tx_row(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        transaction_id: row.get(0)?,
        reference: row.get(1)?,
        user_id: row.get(2)?,
        ticket_id: row.get(3)?,
        tx_type: parse_db_enum(4, &row.get::<_, String>(4)?, TransactionType::from_db_str)?,
        status: parse_db_enum(5, &row.get::<_, String>(5)?, TransactionStatus::from_db_str)?,
        amount: row.get(6)?,
        currency: row.get(7)?,
        payment_method: row.get(8)?,
        source_user_id: row.get(9)?,
        destination_user_id: row.get(10)?,
        created_at: parse_db_ts(11, &row.get::<_, String>(11)?)?,
        validated_at: parse_opt_db_ts(12, row.get(12)?)?,
    })
}

/// 写入流水（可在外部事务内调用）
pub fn insert_transaction(conn: &Connection, tx: &Transaction) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO ledger_transaction (
            transaction_id, reference, user_id, ticket_id, tx_type, status,
            amount, currency, payment_method, source_user_id, destination_user_id,
            created_at, validated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
        params![
            tx.transaction_id,
            tx.reference,
            tx.user_id,
            tx.ticket_id,
            tx.tx_type.to_db_str(),
            tx.status.to_db_str(),
            tx.amount,
            tx.currency,
            tx.payment_method,
            tx.source_user_id,
            tx.destination_user_id,
            to_db_ts(&tx.created_at),
            tx.validated_at.as_ref().map(to_db_ts),
        ],
    )?;
    Ok(())
}

/// 购票流水 VALIDATED → REFUNDED（可在外部事务内调用）
pub fn mark_purchase_refunded(conn: &Connection, ticket_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        UPDATE ledger_transaction SET status = 'REFUNDED'
        WHERE ticket_id = ?1 AND tx_type = 'PURCHASE' AND status = 'VALIDATED'
        "#,
        params![ticket_id],
    )
}

// ==========================================
// TransactionRepository - 交易流水仓储
// ==========================================
pub struct TransactionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TransactionRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, tx: &Transaction) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_transaction(&conn, tx)?;
        Ok(())
    }

    /// 已扣款但未出票: 购票流水(REFUNDED) 与冲正退款流水同一事务写入
    pub fn insert_compensated(
        &self,
        purchase: &Transaction,
        refund: &Transaction,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        insert_transaction(&tx, purchase)?;
        insert_transaction(&tx, refund)?;
        tx.commit()?;
        Ok(())
    }

    pub fn find_by_reference(&self, reference: &str) -> RepositoryResult<Option<Transaction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ledger_transaction WHERE reference = ?1",
            TX_COLUMNS
        );
        Ok(conn.query_row(&sql, params![reference], map_tx_row).optional()?)
    }

    /// 门票的全部流水（按时间）
    pub fn list_by_ticket(&self, ticket_id: &str) -> RepositoryResult<Vec<Transaction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ledger_transaction WHERE ticket_id = ?1 ORDER BY created_at, rowid",
            TX_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let txs = stmt
            .query_map(params![ticket_id], map_tx_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(txs)
    }

    pub fn list_by_user(&self, user_id: &str) -> RepositoryResult<Vec<Transaction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM ledger_transaction WHERE user_id = ?1 ORDER BY created_at, rowid",
            TX_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let txs = stmt
            .query_map(params![user_id], map_tx_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(txs)
    }

    /// 门票的购票流水（最近一条）
    pub fn find_purchase_for_ticket(&self, ticket_id: &str) -> RepositoryResult<Option<Transaction>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM ledger_transaction
            WHERE ticket_id = ?1 AND tx_type = 'PURCHASE'
            ORDER BY created_at DESC, rowid DESC LIMIT 1
            "#,
            TX_COLUMNS
        );
        Ok(conn.query_row(&sql, params![ticket_id], map_tx_row).optional()?)
    }
}
