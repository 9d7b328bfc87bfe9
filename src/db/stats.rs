//! Per-user performance summaries

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

/// Overall performance picture for one user
#[derive(Debug, Clone, Default)]
pub struct UserSummary {
    pub total_facts: i64,
    pub facts_due: i64,
    pub total_attempts: i64,
    pub correct_attempts: i64,
    /// Mean per-fact accuracy percentage over facts with at least one attempt
    pub average_accuracy: f64,
    pub average_ease_factor: f64,
    /// (interval_days, fact count) pairs, ascending by interval
    pub facts_by_interval: Vec<(i64, i64)>,
}

pub fn get_user_summary(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<UserSummary> {
    let total_facts: i64 = conn.query_row(
        "SELECT COUNT(*) FROM fact_states WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    if total_facts == 0 {
        return Ok(UserSummary {
            average_ease_factor: 2.5,
            ..UserSummary::default()
        });
    }

    let facts_due: i64 = conn.query_row(
        "SELECT COUNT(*) FROM fact_states WHERE user_id = ?1 AND next_review <= ?2",
        params![user_id, now.to_rfc3339()],
        |row| row.get(0),
    )?;

    let (total_attempts, correct_attempts): (i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(total_attempts), 0), COALESCE(SUM(correct_attempts), 0)
     FROM fact_states WHERE user_id = ?1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let average_accuracy: f64 = conn.query_row(
        "SELECT COALESCE(AVG(CAST(correct_attempts AS REAL) / total_attempts * 100.0), 0.0)
     FROM fact_states WHERE user_id = ?1 AND total_attempts > 0",
        params![user_id],
        |row| row.get(0),
    )?;

    let average_ease_factor: f64 = conn.query_row(
        "SELECT COALESCE(AVG(ease_factor), 2.5) FROM fact_states WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT interval_days, COUNT(*) FROM fact_states
     WHERE user_id = ?1 GROUP BY interval_days ORDER BY interval_days",
    )?;
    let facts_by_interval = stmt
        .query_map(params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>>>()?;

    Ok(UserSummary {
        total_facts,
        facts_due,
        total_attempts,
        correct_attempts,
        average_accuracy,
        average_ease_factor,
        facts_by_interval,
    })
}
