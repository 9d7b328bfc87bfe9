use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display-only mastery projection derived from SM-2 state.
///
/// Never stored: the SM-2 fields are the single source of truth and this
/// is recomputed from them on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mastery {
  Learning,
  Practicing,
  Mastered,
}

impl Mastery {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Learning => "learning",
      Self::Practicing => "practicing",
      Self::Mastered => "mastered",
    }
  }
}

/// Per-user scheduling and aggregate state for a single math fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactState {
  pub user_id: String,
  /// Opaque fact identity, e.g. "7+8". Operand order is preserved.
  pub fact_key: String,

  // SM-2 state
  /// Consecutive reviews with grade >= 3 since the last reset
  pub repetition_number: i64,
  pub ease_factor: f64,
  pub interval_days: i64,
  pub next_review: DateTime<Utc>,
  pub last_grade: Option<u8>,

  // Aggregates
  pub total_attempts: i64,
  pub correct_attempts: i64,
  pub total_response_time_ms: i64,
  pub fastest_response_ms: Option<i64>,
  pub slowest_response_ms: Option<i64>,
  pub last_attempted: Option<DateTime<Utc>>,

  pub created_at: DateTime<Utc>,
}

impl FactState {
  pub fn new(user_id: &str, fact_key: &str, now: DateTime<Utc>) -> Self {
    Self {
      user_id: user_id.to_string(),
      fact_key: fact_key.to_string(),
      repetition_number: 0,
      ease_factor: 2.5,
      interval_days: 1,
      next_review: now,
      last_grade: None,
      total_attempts: 0,
      correct_attempts: 0,
      total_response_time_ms: 0,
      fastest_response_ms: None,
      slowest_response_ms: None,
      last_attempted: None,
      created_at: now,
    }
  }

  /// Accuracy as a percentage (0.0 to 100.0)
  pub fn accuracy(&self) -> f64 {
    if self.total_attempts > 0 {
      (self.correct_attempts as f64 / self.total_attempts as f64) * 100.0
    } else {
      0.0
    }
  }

  pub fn average_response_time_ms(&self) -> f64 {
    if self.total_attempts > 0 {
      self.total_response_time_ms as f64 / self.total_attempts as f64
    } else {
      0.0
    }
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.next_review <= now
  }

  /// Update aggregate counters with a new attempt outcome.
  pub fn record_outcome(&mut self, is_correct: bool, response_time_ms: i64, now: DateTime<Utc>) {
    self.total_attempts += 1;
    if is_correct {
      self.correct_attempts += 1;
    }
    self.total_response_time_ms += response_time_ms;
    self.fastest_response_ms = Some(match self.fastest_response_ms {
      Some(fastest) => fastest.min(response_time_ms),
      None => response_time_ms,
    });
    self.slowest_response_ms = Some(match self.slowest_response_ms {
      Some(slowest) => slowest.max(response_time_ms),
      None => response_time_ms,
    });
    self.last_attempted = Some(now);
  }

  /// Thresholds: three consecutive successes graduate a fact out of
  /// learning, a three-week interval counts as mastered.
  pub fn mastery(&self) -> Mastery {
    if self.repetition_number >= 3 && self.interval_days >= 21 {
      Mastery::Mastered
    } else if self.repetition_number > 0 {
      Mastery::Practicing
    } else {
      Mastery::Learning
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn state() -> FactState {
    FactState::new("u1", "7+8", Utc::now())
  }

  #[test]
  fn test_new_defaults() {
    let s = state();
    assert_eq!(s.repetition_number, 0);
    assert!((s.ease_factor - 2.5).abs() < f64::EPSILON);
    assert_eq!(s.interval_days, 1);
    assert!(s.last_grade.is_none());
    assert_eq!(s.total_attempts, 0);
    assert_eq!(s.correct_attempts, 0);
    assert!(s.fastest_response_ms.is_none());
    assert!(s.last_attempted.is_none());
  }

  #[test]
  fn test_accuracy_no_attempts() {
    assert_eq!(state().accuracy(), 0.0);
  }

  #[test]
  fn test_record_outcome_updates_aggregates() {
    let mut s = state();
    let now = Utc::now();
    s.record_outcome(true, 1500, now);
    s.record_outcome(false, 4000, now);
    s.record_outcome(true, 900, now);

    assert_eq!(s.total_attempts, 3);
    assert_eq!(s.correct_attempts, 2);
    assert_eq!(s.total_response_time_ms, 6400);
    assert_eq!(s.fastest_response_ms, Some(900));
    assert_eq!(s.slowest_response_ms, Some(4000));
    assert_eq!(s.last_attempted, Some(now));
    assert!((s.accuracy() - 66.666).abs() < 0.01);
  }

  #[test]
  fn test_correct_never_exceeds_total() {
    let mut s = state();
    let now = Utc::now();
    for _ in 0..5 {
      s.record_outcome(true, 1000, now);
    }
    assert!(s.correct_attempts <= s.total_attempts);
  }

  #[test]
  fn test_is_due() {
    let mut s = state();
    let now = Utc::now();
    s.next_review = now - chrono::Duration::hours(1);
    assert!(s.is_due(now));
    s.next_review = now + chrono::Duration::hours(1);
    assert!(!s.is_due(now));
  }

  #[test]
  fn test_serde_roundtrip() {
    let mut s = state();
    s.last_grade = Some(4);
    s.record_outcome(true, 1500, Utc::now());

    let json = serde_json::to_string(&s).unwrap();
    let back: FactState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.fact_key, s.fact_key);
    assert_eq!(back.last_grade, Some(4));
    assert_eq!(back.total_attempts, 1);
    assert_eq!(back.next_review, s.next_review);
  }

  #[test]
  fn test_mastery_projection() {
    let mut s = state();
    assert_eq!(s.mastery(), Mastery::Learning);

    s.repetition_number = 2;
    s.interval_days = 6;
    assert_eq!(s.mastery(), Mastery::Practicing);

    s.repetition_number = 4;
    s.interval_days = 38;
    assert_eq!(s.mastery(), Mastery::Mastered);

    // Long interval alone is not enough after a reset
    s.repetition_number = 0;
    assert_eq!(s.mastery(), Mastery::Learning);
  }
}
