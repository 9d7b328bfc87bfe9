//! Append-only attempt log

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

use crate::domain::AttemptRecord;

const ATTEMPT_COLUMNS: &str = "id, user_id, fact_key, operand1, operand2, user_answer, \
     correct_answer, is_correct, response_time_ms, incorrect_attempts_in_session, grade, attempted_at";

pub fn insert_attempt(conn: &Connection, attempt: &AttemptRecord) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO fact_attempts (user_id, fact_key, operand1, operand2, user_answer,
                               correct_answer, is_correct, response_time_ms,
                               incorrect_attempts_in_session, grade, attempted_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
    "#,
        params![
            attempt.user_id,
            attempt.fact_key,
            attempt.operand1,
            attempt.operand2,
            attempt.user_answer,
            attempt.correct_answer,
            if attempt.is_correct { 1 } else { 0 },
            attempt.response_time_ms,
            attempt.incorrect_attempts_in_session,
            attempt.grade,
            attempt.attempted_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Attempt history for a user, newest first, optionally filtered by fact.
pub fn get_attempts(
    conn: &Connection,
    user_id: &str,
    fact_key: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<AttemptRecord>> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let mut stmt;
    let rows = match fact_key {
        Some(key) => {
            stmt = conn.prepare(&format!(
                r#"
        SELECT {}
        FROM fact_attempts
        WHERE user_id = ?1 AND fact_key = ?2
        ORDER BY attempted_at DESC, id DESC
        LIMIT ?3
        "#,
                ATTEMPT_COLUMNS
            ))?;
            stmt.query_map(params![user_id, key, limit], row_to_attempt)?
        }
        None => {
            stmt = conn.prepare(&format!(
                r#"
        SELECT {}
        FROM fact_attempts
        WHERE user_id = ?1
        ORDER BY attempted_at DESC, id DESC
        LIMIT ?2
        "#,
                ATTEMPT_COLUMNS
            ))?;
            stmt.query_map(params![user_id, limit], row_to_attempt)?
        }
    };

    rows.collect::<Result<Vec<_>>>()
}

fn row_to_attempt(row: &rusqlite::Row) -> Result<AttemptRecord> {
    let is_correct: i64 = row.get(7)?;
    let attempted_at: String = row.get(11)?;

    Ok(AttemptRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        fact_key: row.get(2)?,
        operand1: row.get(3)?,
        operand2: row.get(4)?,
        user_answer: row.get(5)?,
        correct_answer: row.get(6)?,
        is_correct: is_correct != 0,
        response_time_ms: row.get(8)?,
        incorrect_attempts_in_session: row.get(9)?,
        grade: row.get(10)?,
        attempted_at: DateTime::parse_from_rfc3339(&attempted_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
