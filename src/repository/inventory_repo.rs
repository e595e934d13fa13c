// ==========================================
// 世界杯票务系统 - 座位计数仓储
// ==========================================
// 红线: 计数只通过条件 UPDATE 修改，不做应用层读-改-写
//   扣减: ... WHERE available > 0
//   释放: ... WHERE available < capacity
// 自由函数接收 &Connection，可在外部事务 (Transaction) 内复用
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 区域座位 -1（已为 0 时不变，返回 false）
pub fn try_decrement_zone(conn: &Connection, zone_id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE zone SET available = available - 1 WHERE zone_id = ?1 AND available > 0",
        params![zone_id],
    )?;
    Ok(n == 1)
}

/// 区域座位 +1（已满容量时不变，返回 false）
pub fn increment_zone(conn: &Connection, zone_id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE zone SET available = available + 1 WHERE zone_id = ?1 AND available < capacity",
        params![zone_id],
    )?;
    Ok(n == 1)
}

/// 比赛余票 -1（已为 0 时不变，返回 false）
pub fn try_decrement_match(conn: &Connection, match_id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE fixture SET tickets_available = tickets_available - 1
         WHERE match_id = ?1 AND tickets_available > 0",
        params![match_id],
    )?;
    Ok(n == 1)
}

/// 比赛余票 +1（已满容量时不变，返回 false）
pub fn increment_match(conn: &Connection, match_id: &str) -> rusqlite::Result<bool> {
    let n = conn.execute(
        "UPDATE fixture SET tickets_available = tickets_available + 1
         WHERE match_id = ?1 AND tickets_available < capacity",
        params![match_id],
    )?;
    Ok(n == 1)
}

// ==========================================
// InventoryRepository - 座位计数仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn try_decrement_zone(&self, zone_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Ok(try_decrement_zone(&conn, zone_id)?)
    }

    pub fn increment_zone(&self, zone_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Ok(increment_zone(&conn, zone_id)?)
    }

    pub fn try_decrement_match(&self, match_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Ok(try_decrement_match(&conn, match_id)?)
    }

    pub fn increment_match(&self, match_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Ok(increment_match(&conn, match_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use rusqlite::OptionalExtension;

    impl InventoryRepository {
        /// 读取区域计数 (capacity, available)
        fn zone_counts(&self, zone_id: &str) -> RepositoryResult<Option<(i64, i64)>> {
            let conn = self.get_conn()?;
            let counts = conn
                .query_row(
                    "SELECT capacity, available FROM zone WHERE zone_id = ?1",
                    params![zone_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(counts)
        }

        /// 读取比赛计数 (capacity, tickets_available)
        fn match_counts(&self, match_id: &str) -> RepositoryResult<Option<(i64, i64)>> {
            let conn = self.get_conn()?;
            let counts = conn
                .query_row(
                    "SELECT capacity, tickets_available FROM fixture WHERE match_id = ?1",
                    params![match_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(counts)
        }
    }

    fn seed(conn: &Connection) {
        conn.execute_batch(
            r#"
            INSERT INTO fixture (match_id, match_code, kickoff_at, stadium, phase, capacity, tickets_available)
            VALUES ('m1', 'GR-1', '2030-06-14 20:00:00', 'Rabat', 'GROUP_STAGE', 3, 1);
            INSERT INTO zone (zone_id, match_id, name, zone_type, capacity, available)
            VALUES ('z1', 'm1', 'North Stand', 'NORTH_STAND', 2, 1);
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_counters_stay_within_bounds() {
        let conn = open_in_memory().unwrap();
        seed(&conn);
        let repo = InventoryRepository::from_connection(Arc::new(Mutex::new(conn)));

        assert!(repo.try_decrement_zone("z1").unwrap());
        assert!(!repo.try_decrement_zone("z1").unwrap());
        assert_eq!(repo.zone_counts("z1").unwrap(), Some((2, 0)));

        assert!(repo.increment_zone("z1").unwrap());
        assert!(repo.increment_zone("z1").unwrap());
        assert!(!repo.increment_zone("z1").unwrap());
        assert_eq!(repo.zone_counts("z1").unwrap(), Some((2, 2)));

        assert!(repo.try_decrement_match("m1").unwrap());
        assert!(!repo.try_decrement_match("m1").unwrap());
        assert_eq!(repo.match_counts("m1").unwrap(), Some((3, 0)));
        assert_eq!(repo.zone_counts("missing").unwrap(), None);
    }

    #[test]
    fn test_random_sequence_keeps_invariant() {
        let conn = open_in_memory().unwrap();
        seed(&conn);
        let repo = InventoryRepository::from_connection(Arc::new(Mutex::new(conn)));

        let ops = [true, true, false, true, false, false, false, true, true, true, false];
        for dec in ops {
            if dec {
                repo.try_decrement_zone("z1").unwrap();
            } else {
                repo.increment_zone("z1").unwrap();
            }
            let (cap, avail) = repo.zone_counts("z1").unwrap().unwrap();
            assert!(avail >= 0 && avail <= cap);
        }
    }
}
