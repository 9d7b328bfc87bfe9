//! Read-only aggregation over a batch of attempt records from one session.
//!
//! Feedback only; nothing here flows back into scheduling.

use std::collections::HashMap;

use crate::domain::AttemptRecord;

#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
  pub total_attempts: usize,
  pub correct_attempts: usize,
  /// Percentage, 0.0-100.0
  pub accuracy: f64,
  pub mean_response_ms: f64,
  pub median_response_ms: f64,
  /// Unique fact keys in first-seen order
  pub facts_practiced: Vec<String>,
  /// Facts that need attention: latest grade below 3, or failing that the
  /// lowest in-session accuracy
  pub weak_facts: Vec<String>,
}

pub fn summarize_session(attempts: &[AttemptRecord]) -> SessionSummary {
  if attempts.is_empty() {
    return SessionSummary::default();
  }

  let total_attempts = attempts.len();
  let correct_attempts = attempts.iter().filter(|a| a.is_correct).count();
  let accuracy = correct_attempts as f64 / total_attempts as f64 * 100.0;

  let mut times: Vec<i64> = attempts.iter().map(|a| a.response_time_ms).collect();
  times.sort_unstable();
  let mean_response_ms = times.iter().sum::<i64>() as f64 / total_attempts as f64;
  let median_response_ms = if total_attempts % 2 == 1 {
    times[total_attempts / 2] as f64
  } else {
    (times[total_attempts / 2 - 1] + times[total_attempts / 2]) as f64 / 2.0
  };

  // Per-fact last grade and accuracy, in encounter order
  let mut facts_practiced: Vec<String> = Vec::new();
  let mut last_grade: HashMap<&str, u8> = HashMap::new();
  let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
  for a in attempts {
    if !last_grade.contains_key(a.fact_key.as_str()) {
      facts_practiced.push(a.fact_key.clone());
    }
    last_grade.insert(&a.fact_key, a.grade);
    let entry = counts.entry(&a.fact_key).or_insert((0, 0));
    entry.0 += 1;
    if a.is_correct {
      entry.1 += 1;
    }
  }

  let mut weak_facts: Vec<String> = facts_practiced
    .iter()
    .filter(|key| last_grade.get(key.as_str()).is_some_and(|g| *g < 3))
    .cloned()
    .collect();

  if weak_facts.is_empty() {
    // No outright failures: flag the fact the user was least accurate on,
    // if any fact was missed at all
    let weakest = facts_practiced
      .iter()
      .filter_map(|key| {
        let (total, correct) = counts[key.as_str()];
        let rate = correct as f64 / total as f64;
        if rate < 1.0 { Some((key, rate)) } else { None }
      })
      .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((key, _)) = weakest {
      weak_facts.push(key.clone());
    }
  }

  SessionSummary {
    total_attempts,
    correct_attempts,
    accuracy,
    mean_response_ms,
    median_response_ms,
    facts_practiced,
    weak_facts,
  }
}
