//! Attempt-tracking pipeline: validate, grade, schedule, persist.
//!
//! The read-compute-write for one fact runs inside a single transaction so
//! concurrent sessions for the same user can never lose an update. The
//! pipeline has no hidden state: the same input applied to the same prior
//! state always produces the same result, so a conflicted cycle is safe to
//! retry wholesale.

use chrono::{DateTime, Utc};

use crate::db::{self, DbPool, UserSummary};
use crate::domain::{AttemptRecord, FactState};
use crate::error::TrackerError;
use crate::srs::{grader, sm2};

/// One recorded outcome for a fact, as reported by the quiz shell.
#[derive(Debug, Clone)]
pub struct AttemptInput {
  pub user_id: String,
  pub fact_key: String,
  pub operand1: i64,
  pub operand2: i64,
  /// None when the user skipped the problem
  pub user_answer: Option<i64>,
  pub correct_answer: i64,
  pub is_correct: bool,
  pub response_time_ms: i64,
  pub incorrect_attempts_in_session: i64,
}

fn validate(input: &AttemptInput) -> Result<(), TrackerError> {
  if input.user_id.is_empty() {
    return Err(TrackerError::Validation("user id must not be empty".into()));
  }
  if input.fact_key.is_empty() {
    return Err(TrackerError::Validation("fact key must not be empty".into()));
  }
  if input.response_time_ms <= 0 {
    return Err(TrackerError::Validation(format!(
      "response time must be positive, got {}ms",
      input.response_time_ms
    )));
  }
  if input.incorrect_attempts_in_session < 0 {
    return Err(TrackerError::Validation(format!(
      "incorrect attempt count must be non-negative, got {}",
      input.incorrect_attempts_in_session
    )));
  }
  Ok(())
}

/// Record one attempt: derive the grade, advance the SM-2 state, and persist
/// the updated state plus an immutable attempt record atomically.
///
/// The fact state is created lazily on the first attempt for a fact.
pub fn record_attempt(
  pool: &DbPool,
  input: &AttemptInput,
  now: DateTime<Utc>,
) -> Result<FactState, TrackerError> {
  validate(input)?;
  let grade = grader::grade_attempt(input.response_time_ms, input.incorrect_attempts_in_session)?;

  let conn = db::try_lock(pool)?;
  let tx = conn.unchecked_transaction()?;

  let mut state = db::get_fact_state(&tx, &input.user_id, &input.fact_key)?
    .unwrap_or_else(|| FactState::new(&input.user_id, &input.fact_key, now));

  let result = sm2::calculate_sm2(
    grade,
    state.ease_factor,
    state.interval_days,
    state.repetition_number,
    now,
  )?;
  state.ease_factor = result.ease_factor;
  state.interval_days = result.interval_days;
  state.repetition_number = result.repetitions;
  state.next_review = result.next_review;
  state.last_grade = Some(grade);
  state.record_outcome(input.is_correct, input.response_time_ms, now);

  db::upsert_fact_state(&tx, &state)?;
  db::insert_attempt(
    &tx,
    &AttemptRecord {
      id: 0,
      user_id: input.user_id.clone(),
      fact_key: input.fact_key.clone(),
      operand1: input.operand1,
      operand2: input.operand2,
      user_answer: input.user_answer,
      correct_answer: input.correct_answer,
      is_correct: input.is_correct,
      response_time_ms: input.response_time_ms,
      incorrect_attempts_in_session: input.incorrect_attempts_in_session,
      grade,
      attempted_at: now,
    },
  )?;
  tx.commit()?;

  tracing::debug!(
    "Recorded {} for {}: grade {}, reps {}, interval {}d",
    input.fact_key,
    input.user_id,
    grade,
    state.repetition_number,
    state.interval_days
  );

  Ok(state)
}

/// Facts due for review at `now`, most overdue first.
pub fn get_due_facts(
  pool: &DbPool,
  user_id: &str,
  now: DateTime<Utc>,
  limit: Option<usize>,
) -> Result<Vec<FactState>, TrackerError> {
  let conn = db::try_lock(pool)?;
  Ok(db::get_due_facts(&conn, user_id, now, limit)?)
}

/// Scheduling state for one fact; None if the fact was never attempted.
pub fn get_fact_state(
  pool: &DbPool,
  user_id: &str,
  fact_key: &str,
) -> Result<Option<FactState>, TrackerError> {
  let conn = db::try_lock(pool)?;
  Ok(db::get_fact_state(&conn, user_id, fact_key)?)
}

pub fn get_attempts(
  pool: &DbPool,
  user_id: &str,
  fact_key: Option<&str>,
  limit: Option<usize>,
) -> Result<Vec<AttemptRecord>, TrackerError> {
  let conn = db::try_lock(pool)?;
  Ok(db::get_attempts(&conn, user_id, fact_key, limit)?)
}

pub fn get_weak_facts(
  pool: &DbPool,
  user_id: &str,
  now: DateTime<Utc>,
  limit: usize,
) -> Result<Vec<FactState>, TrackerError> {
  let conn = db::try_lock(pool)?;
  Ok(db::get_weak_facts(&conn, user_id, now, limit)?)
}

pub fn get_user_summary(
  pool: &DbPool,
  user_id: &str,
  now: DateTime<Utc>,
) -> Result<UserSummary, TrackerError> {
  let conn = db::try_lock(pool)?;
  Ok(db::get_user_summary(&conn, user_id, now)?)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::srs::sm2::MIN_EASE_FACTOR;
  use crate::testing::TestEnv;
  use chrono::TimeZone;

  fn input(key: &str, rt: i64, errors: i64, correct: bool) -> AttemptInput {
    let (a, b) = key.split_once('+').unwrap();
    let operand1: i64 = a.parse().unwrap();
    let operand2: i64 = b.parse().unwrap();
    AttemptInput {
      user_id: "u1".into(),
      fact_key: key.into(),
      operand1,
      operand2,
      user_answer: if correct { Some(operand1 + operand2) } else { None },
      correct_answer: operand1 + operand2,
      is_correct: correct,
      response_time_ms: rt,
      incorrect_attempts_in_session: errors,
    }
  }

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 25, 9, 30, 0).unwrap()
  }

  #[test]
  fn test_first_attempt_fast_and_correct() {
    let env = TestEnv::new().unwrap();
    let state = record_attempt(&env.pool, &input("7+8", 1500, 0, true), now()).unwrap();

    assert_eq!(state.last_grade, Some(5));
    assert_eq!(state.repetition_number, 1);
    assert_eq!(state.interval_days, 1);
    // EF moves from 2.5 toward 2.6 on a perfect first recall
    assert!((state.ease_factor - 2.6).abs() < 0.01);
    assert_eq!(state.total_attempts, 1);
    assert_eq!(state.correct_attempts, 1);

    // Both the state row and the attempt log exist
    assert!(get_fact_state(&env.pool, "u1", "7+8").unwrap().is_some());
    assert_eq!(get_attempts(&env.pool, "u1", None, None).unwrap().len(), 1);
  }

  #[test]
  fn test_second_success_yields_six_days() {
    let env = TestEnv::new().unwrap();
    record_attempt(&env.pool, &input("7+8", 1500, 0, true), now()).unwrap();
    let state = record_attempt(&env.pool, &input("7+8", 1500, 0, true), now()).unwrap();

    assert_eq!(state.repetition_number, 2);
    assert_eq!(state.interval_days, 6);
  }

  #[test]
  fn test_blackout_resets_established_fact() {
    let env = TestEnv::new().unwrap();
    // Establish repetitions
    for _ in 0..5 {
      record_attempt(&env.pool, &input("6+7", 1500, 0, true), now()).unwrap();
    }
    let before = get_fact_state(&env.pool, "u1", "6+7").unwrap().unwrap();
    assert!(before.repetition_number >= 5);
    assert!(before.interval_days > 6);

    let state = record_attempt(&env.pool, &input("6+7", 4000, 2, false), now()).unwrap();
    assert_eq!(state.last_grade, Some(0));
    assert_eq!(state.repetition_number, 0);
    assert_eq!(state.interval_days, 1);
    assert!(state.ease_factor >= MIN_EASE_FACTOR);
    assert!(state.ease_factor < before.ease_factor);
  }

  #[test]
  fn test_retry_is_idempotent() {
    // Two runs from the same prior state with identical inputs must agree
    let make_state = || {
      let env = TestEnv::new().unwrap();
      record_attempt(&env.pool, &input("2+9", 2500, 0, true), now()).unwrap()
    };
    let a = make_state();
    let b = make_state();

    assert_eq!(a.repetition_number, b.repetition_number);
    assert_eq!(a.interval_days, b.interval_days);
    assert_eq!(a.next_review, b.next_review);
    assert!((a.ease_factor - b.ease_factor).abs() < f64::EPSILON);
    assert_eq!(a.last_grade, b.last_grade);
  }

  #[test]
  fn test_validation_failure_leaves_no_trace() {
    let env = TestEnv::new().unwrap();
    let err = record_attempt(&env.pool, &input("7+8", 0, 0, true), now());
    assert!(matches!(err, Err(TrackerError::Validation(_))));

    assert!(get_fact_state(&env.pool, "u1", "7+8").unwrap().is_none());
    assert!(get_attempts(&env.pool, "u1", None, None).unwrap().is_empty());
  }

  #[test]
  fn test_skip_counts_as_failure() {
    let env = TestEnv::new().unwrap();
    let state = record_attempt(&env.pool, &input("9+9", 8000, 2, false), now()).unwrap();
    assert_eq!(state.correct_attempts, 0);
    assert_eq!(state.total_attempts, 1);
    assert_eq!(state.repetition_number, 0);
  }

  #[test]
  fn test_due_query_through_pool() {
    let env = TestEnv::new().unwrap();
    let t0 = now();
    record_attempt(&env.pool, &input("1+2", 1500, 0, true), t0).unwrap();
    record_attempt(&env.pool, &input("3+4", 1500, 0, true), t0).unwrap();

    // Interval 1 day lands on the next calendar-day boundary
    let tomorrow = Utc.with_ymd_and_hms(2026, 8, 26, 8, 0, 0).unwrap();
    let due = get_due_facts(&env.pool, "u1", tomorrow, None).unwrap();
    assert_eq!(due.len(), 2);

    let due_today = get_due_facts(&env.pool, "u1", t0, None).unwrap();
    assert!(due_today.is_empty());
  }

  #[test]
  fn test_facts_evolve_independently() {
    let env = TestEnv::new().unwrap();
    record_attempt(&env.pool, &input("1+1", 1500, 0, true), now()).unwrap();
    record_attempt(&env.pool, &input("9+8", 5000, 2, false), now()).unwrap();

    let easy = get_fact_state(&env.pool, "u1", "1+1").unwrap().unwrap();
    let hard = get_fact_state(&env.pool, "u1", "9+8").unwrap().unwrap();
    assert_eq!(easy.repetition_number, 1);
    assert_eq!(hard.repetition_number, 0);
    assert!(easy.ease_factor > hard.ease_factor);
  }

  #[test]
  fn test_user_summary_through_pool() {
    let env = TestEnv::new().unwrap();
    record_attempt(&env.pool, &input("1+2", 1500, 0, true), now()).unwrap();
    record_attempt(&env.pool, &input("3+4", 4000, 1, false), now()).unwrap();

    let summary = get_user_summary(&env.pool, "u1", now()).unwrap();
    assert_eq!(summary.total_facts, 2);
    assert_eq!(summary.total_attempts, 2);
    assert_eq!(summary.correct_attempts, 1);
  }
}
