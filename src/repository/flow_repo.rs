// ==========================================
// 世界杯票务系统 - 人流记录仓储
// ==========================================
// 入场/出场直接在区域最新记录上做原子 UPDATE:
//   occupancy 出场时截断在 0，density 由同一语句重算
// ==========================================

use crate::db::{parse_db_ts, to_db_ts};
use crate::domain::flow::FlowRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const FLOW_SELECT: &str = r#"
    SELECT f.flow_id, f.match_id, f.zone_id, z.name,
           f.recorded_at, f.entries, f.exits, f.occupancy, f.capacity, f.density, f.gate
    FROM flow_record f
    JOIN zone z ON z.zone_id = f.zone_id
"#;

/// 区域最新记录的 flow_id 子查询（?1 = match_id, ?2 = zone_id）
const LATEST_FLOW_ID: &str = r#"
    (SELECT flow_id FROM flow_record
     WHERE match_id = ?1 AND zone_id = ?2
     ORDER BY recorded_at DESC, rowid DESC LIMIT 1)
"#;

fn map_flow_row(row: &Row) -> rusqlite::Result<FlowRecord> {
    Ok(FlowRecord {
        flow_id: row.get(0)?,
        match_id: row.get(1)?,
        zone_id: row.get(2)?,
        zone_name: row.get(3)?,
        recorded_at: parse_db_ts(4, &row.get::<_, String>(4)?)?,
        entries: row.get(5)?,
        exits: row.get(6)?,
        occupancy: row.get(7)?,
        capacity: row.get(8)?,
        density: row.get(9)?,
        gate: row.get(10)?,
    })
}

/// 写入人流记录（可在外部事务内调用）
pub fn insert_flow_record(conn: &Connection, record: &FlowRecord) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO flow_record (
            flow_id, match_id, zone_id, recorded_at,
            entries, exits, occupancy, capacity, density, gate
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
        params![
            record.flow_id,
            record.match_id,
            record.zone_id,
            to_db_ts(&record.recorded_at),
            record.entries,
            record.exits,
            record.occupancy,
            record.capacity,
            record.density,
            record.gate,
        ],
    )?;
    Ok(())
}

fn latest_for_zone(
    conn: &Connection,
    match_id: &str,
    zone_id: &str,
) -> rusqlite::Result<Option<FlowRecord>> {
    let sql = format!("{} WHERE f.flow_id = {}", FLOW_SELECT, LATEST_FLOW_ID);
    conn.query_row(&sql, params![match_id, zone_id], map_flow_row)
        .optional()
}

// ==========================================
// FlowRepository - 人流记录仓储
// ==========================================
pub struct FlowRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FlowRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, record: &FlowRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_flow_record(&conn, record)?;
        Ok(())
    }

    /// 入场: entries+1, occupancy+1, 重算 density
    ///
    /// 区域无记录时返回 None
    pub fn apply_entry(
        &self,
        match_id: &str,
        zone_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Option<FlowRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            UPDATE flow_record
            SET entries = entries + 1,
                occupancy = occupancy + 1,
                density = CASE WHEN capacity > 0
                               THEN (occupancy + 1) * 100.0 / capacity
                               ELSE 0 END,
                recorded_at = ?3
            WHERE flow_id = {}
            "#,
            LATEST_FLOW_ID
        );
        let n = conn.execute(&sql, params![match_id, zone_id, to_db_ts(&now)])?;
        if n == 0 {
            return Ok(None);
        }
        Ok(latest_for_zone(&conn, match_id, zone_id)?)
    }

    /// 出场: exits+1, occupancy-1（截断在 0）, 重算 density
    pub fn apply_exit(
        &self,
        match_id: &str,
        zone_id: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<Option<FlowRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            UPDATE flow_record
            SET exits = exits + 1,
                occupancy = MAX(occupancy - 1, 0),
                density = CASE WHEN capacity > 0
                               THEN MAX(occupancy - 1, 0) * 100.0 / capacity
                               ELSE 0 END,
                recorded_at = ?3
            WHERE flow_id = {}
            "#,
            LATEST_FLOW_ID
        );
        let n = conn.execute(&sql, params![match_id, zone_id, to_db_ts(&now)])?;
        if n == 0 {
            return Ok(None);
        }
        Ok(latest_for_zone(&conn, match_id, zone_id)?)
    }

    /// 比赛的全部人流记录
    pub fn list_by_match(&self, match_id: &str) -> RepositoryResult<Vec<FlowRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE f.match_id = ?1 ORDER BY z.name, f.recorded_at",
            FLOW_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![match_id], map_flow_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 密度高于阈值的记录
    pub fn list_above_density(
        &self,
        match_id: &str,
        threshold: f64,
    ) -> RepositoryResult<Vec<FlowRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE f.match_id = ?1 AND f.density > ?2 ORDER BY f.density DESC",
            FLOW_SELECT
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![match_id, threshold], map_flow_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 比赛在场总人数
    pub fn total_occupancy(&self, match_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COALESCE(SUM(occupancy), 0) FROM flow_record WHERE match_id = ?1",
            params![match_id],
            |row| row.get(0),
        )?)
    }

    /// 比赛平均密度（无记录时为 0）
    pub fn mean_density(&self, match_id: &str) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        Ok(conn.query_row(
            "SELECT COALESCE(AVG(density), 0.0) FROM flow_record WHERE match_id = ?1",
            params![match_id],
            |row| row.get(0),
        )?)
    }
}
