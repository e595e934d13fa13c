// ==========================================
// 世界杯票务系统 - 用户仓储
// ==========================================
// 角色负载按 role 列展开到可空列，读取时还原为 UserRole
// ==========================================

use crate::db::{parse_db_ts, to_db_ts};
use crate::domain::user::{AdminProfile, SpectatorProfile, User, UserRole};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const USER_COLUMNS: &str = r#"
    user_id, email, last_name, first_name, role, active,
    nationality, passport_no, tickets_purchased,
    access_level, department, can_manage_users, can_manage_matches, can_view_alerts,
    created_at
"#;

fn map_user_row(row: &Row) -> rusqlite::Result<User> {
    let role_raw: String = row.get(4)?;
    let role = match role_raw.as_str() {
        "SPECTATOR" => UserRole::Spectator(SpectatorProfile {
            nationality: row.get(6)?,
            passport_no: row.get(7)?,
            tickets_purchased: row.get(8)?,
        }),
        "ADMINISTRATOR" => UserRole::Administrator(AdminProfile {
            access_level: row.get::<_, Option<i32>>(9)?.unwrap_or(1),
            department: row.get(10)?,
            can_manage_users: row.get::<_, i64>(11)? != 0,
            can_manage_matches: row.get::<_, i64>(12)? != 0,
            can_view_alerts: row.get::<_, i64>(13)? != 0,
        }),
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("未知用户角色: {}", other).into(),
            ))
        }
    };

    Ok(User {
        user_id: row.get(0)?,
        email: row.get(1)?,
        last_name: row.get(2)?,
        first_name: row.get(3)?,
        active: row.get::<_, i64>(5)? != 0,
        role,
        created_at: parse_db_ts(14, &row.get::<_, String>(14)?)?,
    })
}

/// 观众购票计数 +1（可在外部事务内调用）
pub fn increment_tickets_purchased(conn: &Connection, user_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE app_user SET tickets_purchased = tickets_purchased + 1 WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(())
}

// ==========================================
// UserRepository - 用户仓储
// ==========================================
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, user: &User) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let (spectator, admin) = match &user.role {
            UserRole::Spectator(p) => (Some(p), None),
            UserRole::Administrator(p) => (None, Some(p)),
        };
        conn.execute(
            r#"
            INSERT INTO app_user (
                user_id, email, last_name, first_name, role, active,
                nationality, passport_no, tickets_purchased,
                access_level, department, can_manage_users, can_manage_matches, can_view_alerts,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                user.user_id,
                user.email,
                user.last_name,
                user.first_name,
                user.role.to_db_str(),
                user.active as i64,
                spectator.and_then(|p| p.nationality.clone()),
                spectator.and_then(|p| p.passport_no.clone()),
                spectator.map(|p| p.tickets_purchased).unwrap_or(0),
                admin.map(|p| p.access_level),
                admin.and_then(|p| p.department.clone()),
                admin.map(|p| p.can_manage_users as i64).unwrap_or(0),
                admin.map(|p| p.can_manage_matches as i64).unwrap_or(0),
                admin.map(|p| p.can_view_alerts as i64).unwrap_or(0),
                to_db_ts(&user.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM app_user WHERE user_id = ?1", USER_COLUMNS);
        Ok(conn.query_row(&sql, params![user_id], map_user_row).optional()?)
    }

    /// 按邮箱查找（大小写不敏感）
    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM app_user WHERE lower(email) = lower(?1)",
            USER_COLUMNS
        );
        Ok(conn
            .query_row(&sql, params![email.trim()], map_user_row)
            .optional()?)
    }

    pub fn list_spectators(&self) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM app_user WHERE role = 'SPECTATOR' ORDER BY last_name, first_name",
            USER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map([], map_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn set_active(&self, user_id: &str, active: bool) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let n = conn.execute(
            "UPDATE app_user SET active = ?1 WHERE user_id = ?2",
            params![active as i64, user_id],
        )?;
        Ok(n == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::NaiveDate;

    #[test]
    fn test_role_payload_roundtrip_and_email_lookup() {
        let repo = UserRepository::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap())));
        let created_at = NaiveDate::from_ymd_opt(2030, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let admin = User {
            user_id: "a1".to_string(),
            email: "ops@wc2030.org".to_string(),
            last_name: "Benali".to_string(),
            first_name: "Sara".to_string(),
            active: true,
            role: UserRole::Administrator(AdminProfile {
                access_level: 3,
                department: Some("Security".to_string()),
                can_manage_users: false,
                can_manage_matches: true,
                can_view_alerts: true,
            }),
            created_at,
        };
        repo.insert(&admin).unwrap();

        let found = repo.find_by_email(" OPS@wc2030.org ").unwrap().unwrap();
        assert_eq!(found, admin);
        assert!(found.can_resolve_alerts());
        assert!(repo.find_by_email("nobody@wc2030.org").unwrap().is_none());
    }
}
