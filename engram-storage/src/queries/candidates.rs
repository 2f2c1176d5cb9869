//! The retrieval prefilter and the embedding-lag augmentation query.
//!
//! Conditions and their parameters are appended together through a
//! small builder, so the SQL text and the parameter list cannot drift
//! out of sync.

use chrono::{Duration, Utc};
use rusqlite::Connection;

use engram_core::errors::EngramResult;
use engram_core::memory::{MemoryRecord, Mode};
use engram_core::models::CandidateFilter;

use super::memory_crud::{format_ts, row_to_memory, MEMORY_COLUMNS};
use crate::to_storage_err;

/// Owned TEXT parameter; `Value` has no borrow-aware constructor.
fn text(s: &str) -> rusqlite::types::Value {
    rusqlite::types::Value::Text(s.to_string())
}

/// Cap on rows returned by the lag-augmentation query.
const RECENT_UNEMBEDDED_CAP: usize = 50;

/// Accumulates WHERE conditions together with their parameters.
pub struct QueryBuilder {
    conditions: Vec<String>,
    params: Vec<rusqlite::types::Value>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Append a condition whose placeholder count matches `values`.
    /// Placeholders are written as `?` and numbered on assembly.
    pub fn and(&mut self, condition: &str, values: Vec<rusqlite::types::Value>) {
        debug_assert_eq!(
            condition.matches('?').count(),
            values.len(),
            "placeholder/parameter count mismatch in '{condition}'"
        );
        self.conditions.push(condition.to_string());
        self.params.extend(values);
    }

    /// Append an `IN (...)` condition with one placeholder per value.
    pub fn and_in(&mut self, column: &str, values: Vec<rusqlite::types::Value>) {
        if values.is_empty() {
            return;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.conditions.push(format!("{column} IN ({placeholders})"));
        self.params.extend(values);
    }

    /// Assemble the final SQL and parameter list.
    pub fn build(self, order_and_limit: &str) -> (String, Vec<rusqlite::types::Value>) {
        let where_clause = if self.conditions.is_empty() {
            "1 = 1".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        let sql = format!(
            "SELECT {MEMORY_COLUMNS} FROM memories WHERE {where_clause} {order_and_limit}"
        );
        (sql, self.params)
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply the shared mode-visibility rule: vault (or an explicit
/// all-modes request) reads everything its user owns; otherwise the
/// request mode applies, optionally widened to the general partition.
fn push_mode_filter(builder: &mut QueryBuilder, mode: &Mode, filter: &CandidateFilter) {
    if mode.is_vault() || filter.include_all_modes {
        return;
    }
    if filter.allow_cross_mode && !mode.is_general() {
        builder.and(
            "mode IN (?, ?)",
            vec![text(mode.as_str()), text(Mode::GENERAL)],
        );
    } else {
        builder.and("mode = ?", vec![text(mode.as_str())]);
    }
}

/// The Stage-2 SQL prefilter. `user_id` is always the first condition.
pub fn select_candidates(
    conn: &Connection,
    filter: &CandidateFilter,
) -> EngramResult<Vec<MemoryRecord>> {
    let mut builder = QueryBuilder::new();
    builder.and("user_id = ?", vec![text(&filter.user_id)]);

    if filter.require_embedding {
        builder.and(
            "embedding IS NOT NULL AND embedding_status = 'ready'",
            vec![],
        );
    }
    if filter.only_current {
        builder.and("(is_current = 1 OR is_current IS NULL)", vec![]);
    }
    push_mode_filter(&mut builder, &filter.mode, filter);
    if let Some(categories) = &filter.categories {
        builder.and_in(
            "category",
            categories.iter().map(|c| text(c)).collect(),
        );
    }

    let (sql, params) = builder.build(&format!(
        "ORDER BY relevance_score DESC, created_at DESC LIMIT {}",
        filter.max_candidates
    ));
    run_select(conn, &sql, params)
}

/// Stage 2c: rows created inside the lag window that have no ready
/// embedding yet. Scored by text heuristic downstream.
pub fn recent_unembedded(
    conn: &Connection,
    filter: &CandidateFilter,
    window_secs: u64,
) -> EngramResult<Vec<MemoryRecord>> {
    let cutoff = format_ts(Utc::now() - Duration::seconds(window_secs as i64));

    let mut builder = QueryBuilder::new();
    builder.and("user_id = ?", vec![text(&filter.user_id)]);
    builder.and(
        "(embedding IS NULL OR embedding_status != 'ready')",
        vec![],
    );
    builder.and("(is_current = 1 OR is_current IS NULL)", vec![]);
    builder.and("created_at >= ?", vec![cutoff.into()]);
    push_mode_filter(&mut builder, &filter.mode, filter);

    let (sql, params) = builder.build(&format!(
        "ORDER BY created_at DESC LIMIT {RECENT_UNEMBEDDED_CAP}"
    ));
    run_select(conn, &sql, params)
}

fn run_select(
    conn: &Connection,
    sql: &str,
    params: Vec<rusqlite::types::Value>,
) -> EngramResult<Vec<MemoryRecord>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |row| {
            Ok(row_to_memory(row))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row.map_err(|e| to_storage_err(e.to_string()))??);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_sql_and_params_in_sync() {
        let mut builder = QueryBuilder::new();
        builder.and("user_id = ?", vec![text("u1")]);
        builder.and_in("category", vec![text("a"), text("b")]);
        let (sql, params) = builder.build("LIMIT 10");
        assert!(sql.contains("user_id = ?"));
        assert!(sql.contains("category IN (?, ?)"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_category_set_adds_no_condition() {
        let mut builder = QueryBuilder::new();
        builder.and_in("category", vec![]);
        let (sql, params) = builder.build("");
        assert!(sql.contains("1 = 1"));
        assert!(params.is_empty());
    }
}
