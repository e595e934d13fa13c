// ==========================================
// 世界杯票务系统 - 比赛仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 删除受 ticket.match_id ON DELETE RESTRICT 保护
// ==========================================

use crate::db::{parse_db_enum, parse_db_ts, to_db_ts};
use crate::domain::fixture::Match;
use crate::domain::flow::FlowRecord;
use crate::domain::types::MatchPhase;
use crate::domain::zone::Zone;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::flow_repo::insert_flow_record;
use crate::repository::zone_repo::insert_zone;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub(crate) const MATCH_COLUMNS: &str = r#"
    match_id, match_code, home_team_id, away_team_id, kickoff_at,
    stadium, city, phase, group_name, base_price,
    capacity, tickets_available, completed, home_score, away_score
"#;

pub(crate) fn map_match_row(row: &Row) -> rusqlite::Result<Match> {
    Ok(Match {
        match_id: row.get(0)?,
        match_code: row.get(1)?,
        home_team_id: row.get(2)?,
        away_team_id: row.get(3)?,
        kickoff_at: parse_db_ts(4, &row.get::<_, String>(4)?)?,
        stadium: row.get(5)?,
        city: row.get(6)?,
        phase: parse_db_enum(7, &row.get::<_, String>(7)?, MatchPhase::from_db_str)?,
        group_name: row.get(8)?,
        base_price: row.get(9)?,
        capacity: row.get(10)?,
        tickets_available: row.get(11)?,
        completed: row.get::<_, i64>(12)? != 0,
        home_score: row.get(13)?,
        away_score: row.get(14)?,
    })
}

fn insert_match(conn: &Connection, m: &Match) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO fixture (
            match_id, match_code, home_team_id, away_team_id, kickoff_at,
            stadium, city, phase, group_name, base_price,
            capacity, tickets_available, completed, home_score, away_score
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            m.match_id,
            m.match_code,
            m.home_team_id,
            m.away_team_id,
            to_db_ts(&m.kickoff_at),
            m.stadium,
            m.city,
            m.phase.to_db_str(),
            m.group_name,
            m.base_price,
            m.capacity,
            m.tickets_available,
            m.completed as i64,
            m.home_score,
            m.away_score,
        ],
    )?;
    Ok(())
}

/// 按主键读取比赛（可在外部事务内调用）
pub fn find_match(conn: &Connection, match_id: &str) -> rusqlite::Result<Option<Match>> {
    let sql = format!("SELECT {} FROM fixture WHERE match_id = ?1", MATCH_COLUMNS);
    conn.query_row(&sql, params![match_id], map_match_row).optional()
}

// ==========================================
// MatchRepository - 比赛仓储
// ==========================================
pub struct MatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MatchRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, m: &Match) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_match(&conn, m)?;
        Ok(())
    }

    /// 在同一事务中写入比赛、区域及初始人流记录
    pub fn insert_scheduled(
        &self,
        m: &Match,
        zones: &[Zone],
        flows: &[FlowRecord],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        insert_match(&tx, m)?;
        for zone in zones {
            insert_zone(&tx, zone)?;
        }
        for flow in flows {
            insert_flow_record(&tx, flow)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn find_by_id(&self, match_id: &str) -> RepositoryResult<Option<Match>> {
        let conn = self.get_conn()?;
        Ok(find_match(&conn, match_id)?)
    }

    /// 全部比赛（按开赛时间）
    pub fn list_all(&self) -> RepositoryResult<Vec<Match>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM fixture ORDER BY kickoff_at", MATCH_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let matches = stmt
            .query_map([], map_match_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// 未开赛且未结束的比赛
    pub fn list_upcoming(&self, now: NaiveDateTime) -> RepositoryResult<Vec<Match>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM fixture WHERE completed = 0 AND kickoff_at > ?1 ORDER BY kickoff_at",
            MATCH_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let matches = stmt
            .query_map(params![to_db_ts(&now)], map_match_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    /// 登记比分并标记结束
    pub fn mark_completed(
        &self,
        match_id: &str,
        home_score: i32,
        away_score: i32,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            "UPDATE fixture SET completed = 1, home_score = ?1, away_score = ?2 WHERE match_id = ?3",
            params![home_score, away_score, match_id],
        )?;
        Ok(n == 1)
    }

    /// 删除比赛（区域、人流、告警级联删除）
    pub fn delete(&self, match_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n = conn.execute("DELETE FROM fixture WHERE match_id = ?1", params![match_id])?;
        Ok(n == 1)
    }
}
