// ==========================================
// 世界杯票务系统 - 看台区域仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::parse_db_enum;
use crate::domain::types::ZoneType;
use crate::domain::zone::Zone;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub(crate) const ZONE_COLUMNS: &str = r#"
    zone_id, match_id, name, zone_type, capacity, available,
    price_coefficient, pmr_accessible, gate
"#;

pub(crate) fn map_zone_row(row: &Row) -> rusqlite::Result<Zone> {
    Ok(Zone {
        zone_id: row.get(0)?,
        match_id: row.get(1)?,
        name: row.get(2)?,
        zone_type: parse_db_enum(3, &row.get::<_, String>(3)?, ZoneType::from_db_str)?,
        capacity: row.get(4)?,
        available: row.get(5)?,
        price_coefficient: row.get(6)?,
        pmr_accessible: row.get::<_, i64>(7)? != 0,
        gate: row.get(8)?,
    })
}

/// 插入区域（可在外部事务内调用）
pub fn insert_zone(conn: &Connection, zone: &Zone) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO zone (
            zone_id, match_id, name, zone_type, capacity, available,
            price_coefficient, pmr_accessible, gate
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            zone.zone_id,
            zone.match_id,
            zone.name,
            zone.zone_type.to_db_str(),
            zone.capacity,
            zone.available,
            zone.price_coefficient,
            zone.pmr_accessible as i64,
            zone.gate,
        ],
    )?;
    Ok(())
}

/// 按主键读取区域（可在外部事务内调用）
pub fn find_zone(conn: &Connection, zone_id: &str) -> rusqlite::Result<Option<Zone>> {
    let sql = format!("SELECT {} FROM zone WHERE zone_id = ?1", ZONE_COLUMNS);
    conn.query_row(&sql, params![zone_id], map_zone_row).optional()
}

// ==========================================
// ZoneRepository - 看台区域仓储
// ==========================================
pub struct ZoneRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ZoneRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, zone: &Zone) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_zone(&conn, zone)?;
        Ok(())
    }

    pub fn find_by_id(&self, zone_id: &str) -> RepositoryResult<Option<Zone>> {
        let conn = self.get_conn()?;
        Ok(find_zone(&conn, zone_id)?)
    }

    /// 查询比赛的全部区域（按名称排序）
    pub fn list_by_match(&self, match_id: &str) -> RepositoryResult<Vec<Zone>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM zone WHERE match_id = ?1 ORDER BY name",
            ZONE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let zones = stmt
            .query_map(params![match_id], map_zone_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(zones)
    }

    pub fn update_price_coefficient(&self, zone_id: &str, coefficient: f64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            "UPDATE zone SET price_coefficient = ?1 WHERE zone_id = ?2",
            params![coefficient, zone_id],
        )?;
        Ok(n == 1)
    }
}
