use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::error::TrackerError;

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 4.0;
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

pub struct Sm2Result {
  pub ease_factor: f64,
  pub interval_days: i64,
  pub repetitions: i64,
  pub next_review: DateTime<Utc>,
}

/// Apply one SM-2 review to a fact's scheduling state.
///
/// Invalid grades or prior state out of bounds indicate a caller bug and
/// fail before any computation.
pub fn calculate_sm2(
  grade: u8,
  current_ease_factor: f64,
  current_interval: i64,
  current_repetitions: i64,
  now: DateTime<Utc>,
) -> Result<Sm2Result, TrackerError> {
  if grade > 5 {
    return Err(TrackerError::Validation(format!(
      "grade must be 0-5, got {}",
      grade
    )));
  }
  if !(MIN_EASE_FACTOR..=MAX_EASE_FACTOR).contains(&current_ease_factor) {
    return Err(TrackerError::Validation(format!(
      "ease factor out of bounds: {}",
      current_ease_factor
    )));
  }
  if current_interval <= 0 {
    return Err(TrackerError::Validation(format!(
      "interval must be positive, got {}",
      current_interval
    )));
  }
  if current_repetitions < 0 {
    return Err(TrackerError::Validation(format!(
      "repetition count must be non-negative, got {}",
      current_repetitions
    )));
  }

  let q = grade as f64;

  // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
  let ease_delta = 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02);
  let new_ease_factor = (current_ease_factor + ease_delta).clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR);

  let (new_interval, new_repetitions) = if grade < 3 {
    // Failed review: reset scheduling, EF penalty above still applies
    (1, 0)
  } else {
    let repetitions = current_repetitions + 1;
    // Post-clamp EF feeds the interval growth
    let interval = match repetitions {
      1 => 1,
      2 => 6,
      _ => ((current_interval as f64) * new_ease_factor).round() as i64,
    };
    (interval, repetitions)
  };

  Ok(Sm2Result {
    ease_factor: new_ease_factor,
    interval_days: new_interval,
    repetitions: new_repetitions,
    next_review: next_review_date(now, new_interval),
  })
}

/// Due dates land on calendar-day boundaries: a fact reviewed in the
/// evening comes due the morning of its target day, not at the same
/// clock time, so the review hour does not drift later day after day.
pub fn next_review_date(now: DateTime<Utc>, interval_days: i64) -> DateTime<Utc> {
  let due_day = (now + Duration::days(interval_days)).date_naive();
  due_day.and_time(NaiveTime::MIN).and_utc()
}
