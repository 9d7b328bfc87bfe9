use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single attempt at a math fact. Append-only time series data,
/// never updated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
  pub id: i64,
  pub user_id: String,
  pub fact_key: String,
  pub operand1: i64,
  pub operand2: i64,
  /// None when the user skipped or timed out
  pub user_answer: Option<i64>,
  pub correct_answer: i64,
  pub is_correct: bool,
  pub response_time_ms: i64,
  /// Wrong submissions on this fact earlier in the session, before this outcome
  pub incorrect_attempts_in_session: i64,
  /// Grade (0-5) derived from this attempt
  pub grade: u8,
  pub attempted_at: DateTime<Utc>,
}

impl AttemptRecord {
  pub fn response_time_seconds(&self) -> f64 {
    self.response_time_ms as f64 / 1000.0
  }
}
