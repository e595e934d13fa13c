// ==========================================
// 世界杯票务系统 - 人流分析历史仓储
// ==========================================
// 列表字段以 JSON 文本存储（serde_json）
// ==========================================

use crate::db::{parse_db_enum, parse_db_ts, to_db_ts};
use crate::domain::flow::FlowAnalysis;
use crate::domain::types::AnalysisStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const ANALYSIS_COLUMNS: &str = r#"
    analysis_id, match_id, analyzed_at, status,
    density_mean, density_max, efficiency_score,
    congested_zones_json, recommendations_json, evacuation_minutes
"#;

fn parse_json_list(idx: usize, raw: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_analysis_row(row: &Row) -> rusqlite::Result<FlowAnalysis> {
    Ok(FlowAnalysis {
        analysis_id: row.get(0)?,
        match_id: row.get(1)?,
        analyzed_at: parse_db_ts(2, &row.get::<_, String>(2)?)?,
        status: parse_db_enum(3, &row.get::<_, String>(3)?, AnalysisStatus::from_db_str)?,
        density_mean: row.get(4)?,
        density_max: row.get(5)?,
        efficiency_score: row.get(6)?,
        congested_zones: parse_json_list(7, &row.get::<_, String>(7)?)?,
        recommendations: parse_json_list(8, &row.get::<_, String>(8)?)?,
        evacuation_minutes: row.get(9)?,
    })
}

pub struct FlowAnalysisRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FlowAnalysisRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, analysis: &FlowAnalysis) -> RepositoryResult<()> {
        let congested = serde_json::to_string(&analysis.congested_zones)?;
        let recommendations = serde_json::to_string(&analysis.recommendations)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO flow_analysis (
                analysis_id, match_id, analyzed_at, status,
                density_mean, density_max, efficiency_score,
                congested_zones_json, recommendations_json, evacuation_minutes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                analysis.analysis_id,
                analysis.match_id,
                to_db_ts(&analysis.analyzed_at),
                analysis.status.to_db_str(),
                analysis.density_mean,
                analysis.density_max,
                analysis.efficiency_score,
                congested,
                recommendations,
                analysis.evacuation_minutes,
            ],
        )?;
        Ok(())
    }

    pub fn find_latest(&self, match_id: &str) -> RepositoryResult<Option<FlowAnalysis>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM flow_analysis WHERE match_id = ?1
            ORDER BY analyzed_at DESC, rowid DESC LIMIT 1
            "#,
            ANALYSIS_COLUMNS
        );
        Ok(conn.query_row(&sql, params![match_id], map_analysis_row).optional()?)
    }

    /// 分析历史（新 → 旧）
    pub fn list_by_match(&self, match_id: &str) -> RepositoryResult<Vec<FlowAnalysis>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM flow_analysis WHERE match_id = ?1 ORDER BY analyzed_at DESC, rowid DESC",
            ANALYSIS_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![match_id], map_analysis_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 效率评分低于阈值的分析（不含 NO_DATA）
    pub fn list_low_score(&self, threshold: f64) -> RepositoryResult<Vec<FlowAnalysis>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM flow_analysis
            WHERE status = 'COMPLETED' AND efficiency_score < ?1
            ORDER BY efficiency_score ASC
            "#,
            ANALYSIS_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![threshold], map_analysis_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
