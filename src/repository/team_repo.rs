// ==========================================
// 世界杯票务系统 - 球队仓储
// ==========================================

use crate::domain::fixture::Team;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

fn map_team_row(row: &Row) -> rusqlite::Result<Team> {
    Ok(Team {
        team_id: row.get(0)?,
        name: row.get(1)?,
        country_code: row.get(2)?,
        group_name: row.get(3)?,
    })
}

pub struct TeamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeamRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, team: &Team) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO team (team_id, name, country_code, group_name) VALUES (?1, ?2, ?3, ?4)",
            params![team.team_id, team.name, team.country_code, team.group_name],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, team_id: &str) -> RepositoryResult<Option<Team>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT team_id, name, country_code, group_name FROM team WHERE team_id = ?1",
                params![team_id],
                map_team_row,
            )
            .optional()?)
    }

    /// 按小组查询（group 为空时返回全部）
    pub fn list(&self, group_name: Option<&str>) -> RepositoryResult<Vec<Team>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT team_id, name, country_code, group_name FROM team
            WHERE ?1 IS NULL OR group_name = ?1
            ORDER BY group_name, name
            "#,
        )?;
        let teams = stmt
            .query_map(params![group_name], map_team_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teams)
    }
}
