use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Complete schema for new databases; migrations below upgrade old ones
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS fact_states (
      user_id TEXT NOT NULL,
      fact_key TEXT NOT NULL,
      repetition_number INTEGER NOT NULL DEFAULT 0,
      ease_factor REAL NOT NULL DEFAULT 2.5,
      interval_days INTEGER NOT NULL DEFAULT 1,
      next_review TEXT NOT NULL,
      last_grade INTEGER,
      total_attempts INTEGER NOT NULL DEFAULT 0,
      correct_attempts INTEGER NOT NULL DEFAULT 0,
      total_response_time_ms INTEGER NOT NULL DEFAULT 0,
      fastest_response_ms INTEGER,
      slowest_response_ms INTEGER,
      last_attempted TEXT,
      created_at TEXT NOT NULL,
      PRIMARY KEY (user_id, fact_key)
    );

    CREATE TABLE IF NOT EXISTS fact_attempts (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      user_id TEXT NOT NULL,
      fact_key TEXT NOT NULL,
      operand1 INTEGER NOT NULL,
      operand2 INTEGER NOT NULL,
      user_answer INTEGER,
      correct_answer INTEGER NOT NULL,
      is_correct INTEGER NOT NULL,
      response_time_ms INTEGER NOT NULL,
      incorrect_attempts_in_session INTEGER NOT NULL DEFAULT 0,
      grade INTEGER NOT NULL,
      attempted_at TEXT NOT NULL
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_fact_states_next_review ON fact_states(user_id, next_review);
    CREATE INDEX IF NOT EXISTS idx_fact_attempts_fact ON fact_attempts(user_id, fact_key);
    CREATE INDEX IF NOT EXISTS idx_fact_attempts_attempted_at ON fact_attempts(attempted_at);
    "#,
  )?;

  // Migration: last_grade was added to fact_states after the first release
  add_column_if_missing(conn, "fact_states", "last_grade", "INTEGER")?;

  // Migration: attempts gained the per-session error count
  add_column_if_missing(
    conn,
    "fact_attempts",
    "incorrect_attempts_in_session",
    "INTEGER NOT NULL DEFAULT 0",
  )?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
