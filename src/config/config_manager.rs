// ==========================================
// 世界杯票务系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::policy::{AlertPolicy, FlowPolicy, TicketingPolicy};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    // ===== 人流分析 =====
    pub const FLOW_CONGESTION_THRESHOLD: &str = "flow.congestion_threshold";
    pub const FLOW_PENALTY_START: &str = "flow.penalty_start";
    pub const FLOW_PENALTY_FACTOR: &str = "flow.penalty_factor";
    pub const FLOW_MEAN_WARNING: &str = "flow.mean_warning_threshold";
    pub const FLOW_LOW_SCORE: &str = "flow.low_score_threshold";
    pub const FLOW_THROUGHPUT_PER_GATE: &str = "flow.throughput_per_gate";
    pub const FLOW_DEFAULT_GATES: &str = "flow.default_gate_count";

    // ===== 告警 =====
    pub const ALERT_ENTRY_HIGH: &str = "alert.entry_high";
    pub const ALERT_ENTRY_CRITICAL: &str = "alert.entry_critical";
    pub const ALERT_SWEEP_MEDIUM: &str = "alert.sweep_medium";
    pub const ALERT_SWEEP_HIGH: &str = "alert.sweep_high";
    pub const ALERT_SWEEP_CRITICAL: &str = "alert.sweep_critical";
    pub const ALERT_FLOW_SWEEP_CRITICAL: &str = "alert.flow_sweep_critical";

    // ===== 售票 =====
    pub const TICKET_MAX_TRANSFERS: &str = "ticket.max_transfers";
    pub const TICKET_DEFAULT_BASE_PRICE: &str = "ticket.default_base_price";
    pub const TICKET_PAYMENT_METHOD: &str = "ticket.payment_method";
    pub const TICKET_CURRENCY: &str = "ticket.currency";
    pub const TICKET_PAYMENT_SUCCESS_RATE: &str = "ticket.payment_success_rate";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Ok(conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置；缺失或格式错误时使用默认值
    fn get_parsed_or<T: FromStr + Copy>(&self, key: &str, default: T) -> RepositoryResult<T> {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有 global 配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 策略对象 =====

    pub fn flow_policy(&self) -> RepositoryResult<FlowPolicy> {
        let d = FlowPolicy::default();
        Ok(FlowPolicy {
            congestion_threshold: self
                .get_parsed_or(config_keys::FLOW_CONGESTION_THRESHOLD, d.congestion_threshold)?,
            penalty_start: self.get_parsed_or(config_keys::FLOW_PENALTY_START, d.penalty_start)?,
            penalty_factor: self.get_parsed_or(config_keys::FLOW_PENALTY_FACTOR, d.penalty_factor)?,
            mean_warning_threshold: self
                .get_parsed_or(config_keys::FLOW_MEAN_WARNING, d.mean_warning_threshold)?,
            low_score_threshold: self
                .get_parsed_or(config_keys::FLOW_LOW_SCORE, d.low_score_threshold)?,
            throughput_per_gate: self
                .get_parsed_or(config_keys::FLOW_THROUGHPUT_PER_GATE, d.throughput_per_gate)?,
            default_gate_count: self
                .get_parsed_or(config_keys::FLOW_DEFAULT_GATES, d.default_gate_count)?,
        })
    }

    pub fn alert_policy(&self) -> RepositoryResult<AlertPolicy> {
        let d = AlertPolicy::default();
        Ok(AlertPolicy {
            entry_high: self.get_parsed_or(config_keys::ALERT_ENTRY_HIGH, d.entry_high)?,
            entry_critical: self.get_parsed_or(config_keys::ALERT_ENTRY_CRITICAL, d.entry_critical)?,
            sweep_medium: self.get_parsed_or(config_keys::ALERT_SWEEP_MEDIUM, d.sweep_medium)?,
            sweep_high: self.get_parsed_or(config_keys::ALERT_SWEEP_HIGH, d.sweep_high)?,
            sweep_critical: self.get_parsed_or(config_keys::ALERT_SWEEP_CRITICAL, d.sweep_critical)?,
            flow_sweep_critical: self
                .get_parsed_or(config_keys::ALERT_FLOW_SWEEP_CRITICAL, d.flow_sweep_critical)?,
        })
    }

    pub fn ticketing_policy(&self) -> RepositoryResult<TicketingPolicy> {
        let d = TicketingPolicy::default();
        Ok(TicketingPolicy {
            max_transfers: self.get_parsed_or(config_keys::TICKET_MAX_TRANSFERS, d.max_transfers)?,
            default_base_price: self
                .get_parsed_or(config_keys::TICKET_DEFAULT_BASE_PRICE, d.default_base_price)?,
            payment_method: self
                .get_config_value(config_keys::TICKET_PAYMENT_METHOD)?
                .unwrap_or(d.payment_method),
            currency: self
                .get_config_value(config_keys::TICKET_CURRENCY)?
                .unwrap_or(d.currency),
            payment_success_rate: self
                .get_parsed_or(config_keys::TICKET_PAYMENT_SUCCESS_RATE, d.payment_success_rate)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn manager() -> ConfigManager {
        ConfigManager::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_defaults_when_empty() {
        let cm = manager();
        assert_eq!(cm.flow_policy().unwrap(), FlowPolicy::default());
        assert_eq!(cm.alert_policy().unwrap(), AlertPolicy::default());
        assert_eq!(cm.ticketing_policy().unwrap().max_transfers, 3);
    }

    #[test]
    fn test_override_and_bad_value_fallback() {
        let cm = manager();
        cm.set_config_value(config_keys::FLOW_DEFAULT_GATES, "12").unwrap();
        cm.set_config_value(config_keys::ALERT_ENTRY_HIGH, "abc").unwrap();

        assert_eq!(cm.flow_policy().unwrap().default_gate_count, 12);
        assert_eq!(cm.alert_policy().unwrap().entry_high, 90.0);

        let snapshot: BTreeMap<String, String> =
            serde_json::from_str(&cm.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot.get(config_keys::FLOW_DEFAULT_GATES).map(String::as_str), Some("12"));
    }
}
