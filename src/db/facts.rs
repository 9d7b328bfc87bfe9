//! Per-fact scheduling state queries.
//!
//! Timestamps are stored as RFC 3339 UTC strings; a single format keeps
//! lexicographic and chronological order identical for the due query.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Result, params};

use crate::domain::FactState;

const FACT_STATE_COLUMNS: &str = "user_id, fact_key, repetition_number, ease_factor, interval_days, \
   next_review, last_grade, total_attempts, correct_attempts, total_response_time_ms, \
   fastest_response_ms, slowest_response_ms, last_attempted, created_at";

pub fn upsert_fact_state(conn: &Connection, state: &FactState) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO fact_states (user_id, fact_key, repetition_number, ease_factor, interval_days,
                             next_review, last_grade, total_attempts, correct_attempts,
                             total_response_time_ms, fastest_response_ms, slowest_response_ms,
                             last_attempted, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
    ON CONFLICT(user_id, fact_key) DO UPDATE SET
      repetition_number = excluded.repetition_number,
      ease_factor = excluded.ease_factor,
      interval_days = excluded.interval_days,
      next_review = excluded.next_review,
      last_grade = excluded.last_grade,
      total_attempts = excluded.total_attempts,
      correct_attempts = excluded.correct_attempts,
      total_response_time_ms = excluded.total_response_time_ms,
      fastest_response_ms = excluded.fastest_response_ms,
      slowest_response_ms = excluded.slowest_response_ms,
      last_attempted = excluded.last_attempted
    "#,
    params![
      state.user_id,
      state.fact_key,
      state.repetition_number,
      state.ease_factor,
      state.interval_days,
      state.next_review.to_rfc3339(),
      state.last_grade,
      state.total_attempts,
      state.correct_attempts,
      state.total_response_time_ms,
      state.fastest_response_ms,
      state.slowest_response_ms,
      state.last_attempted.map(|dt| dt.to_rfc3339()),
      state.created_at.to_rfc3339(),
    ],
  )?;
  Ok(())
}

pub fn get_fact_state(conn: &Connection, user_id: &str, fact_key: &str) -> Result<Option<FactState>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM fact_states WHERE user_id = ?1 AND fact_key = ?2",
    FACT_STATE_COLUMNS
  ))?;

  let mut rows = stmt.query(params![user_id, fact_key])?;
  if let Some(row) = rows.next()? {
    Ok(Some(row_to_fact_state(row)?))
  } else {
    Ok(None)
  }
}

/// Facts due at `now`, most overdue first. `limit` of None returns all.
pub fn get_due_facts(
  conn: &Connection,
  user_id: &str,
  now: DateTime<Utc>,
  limit: Option<usize>,
) -> Result<Vec<FactState>> {
  let mut stmt = conn.prepare(&format!(
    r#"
    SELECT {}
    FROM fact_states
    WHERE user_id = ?1 AND next_review <= ?2
    ORDER BY next_review ASC
    LIMIT ?3
    "#,
    FACT_STATE_COLUMNS
  ))?;

  // SQLite treats a negative LIMIT as unlimited
  let limit = limit.map(|l| l as i64).unwrap_or(-1);
  let facts = stmt
    .query_map(params![user_id, now.to_rfc3339(), limit], row_to_fact_state)?
    .collect::<Result<Vec<_>>>()?;
  Ok(facts)
}

pub fn get_due_count(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM fact_states WHERE user_id = ?1 AND next_review <= ?2",
    params![user_id, now.to_rfc3339()],
    |row| row.get(0),
  )
}

pub fn get_all_fact_states(conn: &Connection, user_id: &str) -> Result<Vec<FactState>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {} FROM fact_states WHERE user_id = ?1 ORDER BY fact_key",
    FACT_STATE_COLUMNS
  ))?;

  let facts = stmt
    .query_map(params![user_id], row_to_fact_state)?
    .collect::<Result<Vec<_>>>()?;
  Ok(facts)
}

/// Facts that need the most practice: due facts first, then the lowest
/// ease factors.
pub fn get_weak_facts(
  conn: &Connection,
  user_id: &str,
  now: DateTime<Utc>,
  limit: usize,
) -> Result<Vec<FactState>> {
  let mut stmt = conn.prepare(&format!(
    r#"
    SELECT {}
    FROM fact_states
    WHERE user_id = ?1
    ORDER BY CASE WHEN next_review <= ?2 THEN 0 ELSE 1 END, ease_factor ASC
    LIMIT ?3
    "#,
    FACT_STATE_COLUMNS
  ))?;

  let facts = stmt
    .query_map(params![user_id, now.to_rfc3339(), limit as i64], row_to_fact_state)?
    .collect::<Result<Vec<_>>>()?;
  Ok(facts)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_else(|_| Utc::now())
}

fn row_to_fact_state(row: &rusqlite::Row) -> Result<FactState> {
  let next_review: String = row.get(5)?;
  let last_attempted: Option<String> = row.get(12)?;
  let created_at: String = row.get(13)?;

  Ok(FactState {
    user_id: row.get(0)?,
    fact_key: row.get(1)?,
    repetition_number: row.get(2)?,
    ease_factor: row.get(3)?,
    interval_days: row.get(4)?,
    next_review: parse_timestamp(&next_review),
    last_grade: row.get(6)?,
    total_attempts: row.get(7)?,
    correct_attempts: row.get(8)?,
    total_response_time_ms: row.get(9)?,
    fastest_response_ms: row.get(10)?,
    slowest_response_ms: row.get(11)?,
    last_attempted: last_attempted.as_deref().map(parse_timestamp),
    created_at: parse_timestamp(&created_at),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::schema::run_migrations;
  use chrono::Duration;

  fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    conn
  }

  fn fact(user: &str, key: &str, due: DateTime<Utc>) -> FactState {
    let mut s = FactState::new(user, key, due);
    s.next_review = due;
    s
  }

  #[test]
  fn test_upsert_then_get_roundtrip() {
    let conn = test_conn();
    let now = Utc::now();
    let mut state = fact("u1", "7+8", now);
    state.last_grade = Some(5);
    state.record_outcome(true, 1500, now);
    upsert_fact_state(&conn, &state).unwrap();

    let loaded = get_fact_state(&conn, "u1", "7+8").unwrap().unwrap();
    assert_eq!(loaded.fact_key, "7+8");
    assert_eq!(loaded.last_grade, Some(5));
    assert_eq!(loaded.total_attempts, 1);
    assert_eq!(loaded.fastest_response_ms, Some(1500));
    assert!((loaded.ease_factor - 2.5).abs() < f64::EPSILON);
  }

  #[test]
  fn test_get_missing_fact_state() {
    let conn = test_conn();
    assert!(get_fact_state(&conn, "u1", "1+1").unwrap().is_none());
  }

  #[test]
  fn test_upsert_overwrites() {
    let conn = test_conn();
    let now = Utc::now();
    let mut state = fact("u1", "7+8", now);
    upsert_fact_state(&conn, &state).unwrap();

    state.repetition_number = 3;
    state.interval_days = 15;
    upsert_fact_state(&conn, &state).unwrap();

    let loaded = get_fact_state(&conn, "u1", "7+8").unwrap().unwrap();
    assert_eq!(loaded.repetition_number, 3);
    assert_eq!(loaded.interval_days, 15);

    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM fact_states", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 1);
  }

  #[test]
  fn test_due_facts_ordering_and_exclusion() {
    let conn = test_conn();
    let now = Utc::now();

    upsert_fact_state(&conn, &fact("u1", "2+2", now - Duration::days(1))).unwrap();
    upsert_fact_state(&conn, &fact("u1", "3+4", now - Duration::days(3))).unwrap();
    upsert_fact_state(&conn, &fact("u1", "5+5", now + Duration::days(2))).unwrap();
    // Another user's overdue fact must not leak in
    upsert_fact_state(&conn, &fact("u2", "9+9", now - Duration::days(5))).unwrap();

    let due = get_due_facts(&conn, "u1", now, None).unwrap();
    let keys: Vec<&str> = due.iter().map(|f| f.fact_key.as_str()).collect();
    assert_eq!(keys, vec!["3+4", "2+2"]);

    for f in &due {
      assert!(f.next_review <= now);
    }
  }

  #[test]
  fn test_due_facts_limit() {
    let conn = test_conn();
    let now = Utc::now();
    for i in 0..5 {
      upsert_fact_state(&conn, &fact("u1", &format!("{}+1", i), now - Duration::days(i))).unwrap();
    }

    let due = get_due_facts(&conn, "u1", now, Some(2)).unwrap();
    assert_eq!(due.len(), 2);
    assert_eq!(get_due_count(&conn, "u1", now).unwrap(), 5);
  }

  #[test]
  fn test_due_boundary_inclusive() {
    let conn = test_conn();
    let now = Utc::now();
    upsert_fact_state(&conn, &fact("u1", "4+4", now)).unwrap();

    let due = get_due_facts(&conn, "u1", now, None).unwrap();
    assert_eq!(due.len(), 1);
  }

  #[test]
  fn test_weak_facts_due_first_then_low_ease() {
    let conn = test_conn();
    let now = Utc::now();

    let mut strong = fact("u1", "1+1", now + Duration::days(10));
    strong.ease_factor = 3.2;
    let mut shaky = fact("u1", "6+7", now + Duration::days(2));
    shaky.ease_factor = 1.4;
    let overdue = fact("u1", "8+5", now - Duration::days(1));

    upsert_fact_state(&conn, &strong).unwrap();
    upsert_fact_state(&conn, &shaky).unwrap();
    upsert_fact_state(&conn, &overdue).unwrap();

    let weak = get_weak_facts(&conn, "u1", now, 2).unwrap();
    let keys: Vec<&str> = weak.iter().map(|f| f.fact_key.as_str()).collect();
    assert_eq!(keys, vec!["8+5", "6+7"]);
  }
}
