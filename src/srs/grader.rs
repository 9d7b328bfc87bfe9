use crate::error::TrackerError;

/// Responses under this count as perfect recall
pub const FAST_RECALL_MS: i64 = 2000;
/// Responses at or over this count as slow
pub const SLOW_RECALL_MS: i64 = 3000;

/// Derive an SM-2 quality grade (0-5) from response latency and the number
/// of wrong submissions made on the fact earlier in the session.
///
/// - 0: blackout (two or more errors)
/// - 1: familiar but slow after seeing the answer
/// - 2: recalled quickly after one error
/// - 3: correct first try with significant effort
/// - 4: correct first try with some hesitation
/// - 5: perfect recall
pub fn grade_attempt(response_time_ms: i64, errors_in_session: i64) -> Result<u8, TrackerError> {
  if response_time_ms <= 0 {
    return Err(TrackerError::Validation(format!(
      "response time must be positive, got {}ms",
      response_time_ms
    )));
  }
  if errors_in_session < 0 {
    return Err(TrackerError::Validation(format!(
      "error count must be non-negative, got {}",
      errors_in_session
    )));
  }

  let grade = if errors_in_session >= 2 {
    0
  } else if errors_in_session == 1 {
    if response_time_ms >= SLOW_RECALL_MS { 1 } else { 2 }
  } else if response_time_ms >= SLOW_RECALL_MS {
    3
  } else if response_time_ms >= FAST_RECALL_MS {
    4
  } else {
    5
  };
  Ok(grade)
}
