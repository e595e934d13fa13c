// ==========================================
// 世界杯票务系统 - 告警仓储
// ==========================================
// 每次越限都追加新告警（不去重）
// ==========================================

use crate::db::{parse_db_enum, parse_db_ts, parse_opt_db_ts, to_db_ts};
use crate::domain::alert::Alert;
use crate::domain::types::{AlertLevel, AlertType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::sync::{Arc, Mutex};

const ALERT_COLUMNS: &str = r#"
    alert_id, title, message, alert_type, level, match_id, zone_id, source,
    created_at, resolved, resolved_at, resolved_by, resolution_comment
"#;

fn map_alert_row(row: &Row) -> rusqlite::Result<Alert> {
    Ok(Alert {
        alert_id: row.get(0)?,
        title: row.get(1)?,
        message: row.get(2)?,
        alert_type: parse_db_enum(3, &row.get::<_, String>(3)?, AlertType::from_db_str)?,
        level: parse_db_enum(4, &row.get::<_, String>(4)?, AlertLevel::from_db_str)?,
        match_id: row.get(5)?,
        zone_id: row.get(6)?,
        source: row.get(7)?,
        created_at: parse_db_ts(8, &row.get::<_, String>(8)?)?,
        resolved: row.get::<_, i64>(9)? != 0,
        resolved_at: parse_opt_db_ts(10, row.get(10)?)?,
        resolved_by: row.get(11)?,
        resolution_comment: row.get(12)?,
    })
}

pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, alert: &Alert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO alert (
                alert_id, title, message, alert_type, level, match_id, zone_id, source,
                created_at, resolved, resolved_at, resolved_by, resolution_comment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                alert.alert_id,
                alert.title,
                alert.message,
                alert.alert_type.to_db_str(),
                alert.level.to_db_str(),
                alert.match_id,
                alert.zone_id,
                alert.source,
                to_db_ts(&alert.created_at),
                alert.resolved as i64,
                alert.resolved_at.as_ref().map(to_db_ts),
                alert.resolved_by,
                alert.resolution_comment,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, alert_id: &str) -> RepositoryResult<Option<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM alert WHERE alert_id = ?1", ALERT_COLUMNS);
        Ok(conn.query_row(&sql, params![alert_id], map_alert_row).optional()?)
    }

    fn query(&self, tail: &str, args: &[&dyn ToSql]) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM alert {}", ALERT_COLUMNS, tail);
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(args, map_alert_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    /// 未处理告警（新 → 旧）
    pub fn list_active(&self) -> RepositoryResult<Vec<Alert>> {
        self.query("WHERE resolved = 0 ORDER BY created_at DESC, rowid DESC", &[])
    }

    /// 未处理的 HIGH / CRITICAL 告警
    pub fn list_critical(&self) -> RepositoryResult<Vec<Alert>> {
        self.query(
            r#"
            WHERE resolved = 0 AND level IN ('HIGH', 'CRITICAL')
            ORDER BY CASE level WHEN 'CRITICAL' THEN 0 ELSE 1 END, created_at DESC, rowid DESC
            "#,
            &[],
        )
    }

    pub fn list_by_match(&self, match_id: &str) -> RepositoryResult<Vec<Alert>> {
        self.query(
            "WHERE match_id = ?1 ORDER BY created_at DESC, rowid DESC",
            &[&match_id],
        )
    }

    pub fn list_by_zone(&self, zone_id: &str) -> RepositoryResult<Vec<Alert>> {
        self.query(
            "WHERE zone_id = ?1 ORDER BY created_at DESC, rowid DESC",
            &[&zone_id],
        )
    }

    /// 最近 N 条告警
    pub fn list_latest(&self, limit: u32) -> RepositoryResult<Vec<Alert>> {
        self.query("ORDER BY created_at DESC, rowid DESC LIMIT ?1", &[&limit])
    }

    pub fn count_active(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM alert WHERE resolved = 0", [], |row| {
            row.get(0)
        })?)
    }

    /// 处理告警（仅对未处理告警生效）
    pub fn resolve(
        &self,
        alert_id: &str,
        admin_id: &str,
        comment: Option<&str>,
        now: NaiveDateTime,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            r#"
            UPDATE alert
            SET resolved = 1, resolved_at = ?1, resolved_by = ?2, resolution_comment = ?3
            WHERE alert_id = ?4 AND resolved = 0
            "#,
            params![to_db_ts(&now), admin_id, comment, alert_id],
        )?;
        Ok(n == 1)
    }
}
