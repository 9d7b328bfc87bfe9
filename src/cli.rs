//! Terminal shell: menus, prompts, and the practice loop.
//!
//! Thin plumbing around the tracker. Response times come from a wall-clock
//! `Instant` started when the problem is shown; wrong submissions re-prompt
//! and count toward the error total that feeds grading.

use std::io::{self, Write};
use std::time::Instant;

use chrono::Utc;

use crate::config;
use crate::db::{DbPool, LogOnError};
use crate::domain::AttemptRecord;
use crate::error::TrackerError;
use crate::generator::{Difficulty, Problem, ProblemGenerator};
use crate::session::summarize_session;
use crate::tracker::{self, AttemptInput};

pub fn run(pool: &DbPool, user_id: &str) {
  println!("Welcome to MathFacts, {}!", user_id);

  loop {
    println!();
    println!("1. Practice addition");
    println!("2. Review due facts");
    println!("3. Progress");
    println!("4. Quit");

    match read_line("Choose an option").as_str() {
      "1" => practice_session(pool, user_id),
      "2" => review_due(pool, user_id),
      "3" => show_progress(pool, user_id),
      "4" | "q" | "quit" => {
        println!("Goodbye!");
        return;
      }
      other => println!("Unknown option '{}'", other),
    }
  }
}

fn practice_session(pool: &DbPool, user_id: &str) {
  println!();
  println!("Difficulty levels:");
  for level in 1..=5u8 {
    if let Some(d) = Difficulty::from_level(level) {
      println!("{}. {}", level, d.description());
    }
  }

  let low = read_difficulty("Lowest difficulty", Difficulty::SingleDigit);
  let high = read_difficulty("Highest difficulty", low);
  let generator = match ProblemGenerator::new(low, high) {
    Ok(g) => g,
    Err(e) => {
      println!("{}", e);
      return;
    }
  };

  let count = read_number("Number of problems", config::DEFAULT_PROBLEM_COUNT as i64).max(1) as usize;

  let mut rng = rand::rng();
  let mut attempts = Vec::new();
  for i in 0..count {
    let problem = generator.next_problem(&mut rng);
    println!();
    println!("Problem {}/{}", i + 1, count);
    match run_problem(pool, user_id, problem) {
      Some(attempt) => attempts.push(attempt),
      None => break, // user quit mid-session
    }
  }

  print_session_summary(&attempts);
}

fn review_due(pool: &DbPool, user_id: &str) {
  let due = match tracker::get_due_facts(pool, user_id, Utc::now(), Some(config::DUE_REVIEW_LIMIT)) {
    Ok(due) => due,
    Err(e) => {
      println!("Could not load due facts: {}", e);
      return;
    }
  };

  if due.is_empty() {
    println!("Nothing due for review. Come back tomorrow!");
    return;
  }

  println!("{} fact(s) due for review", due.len());
  let mut attempts = Vec::new();
  for state in due {
    let Some(problem) = Problem::from_fact_key(&state.fact_key) else {
      tracing::warn!("Skipping unparseable fact key '{}'", state.fact_key);
      continue;
    };
    println!();
    match run_problem(pool, user_id, problem) {
      Some(attempt) => attempts.push(attempt),
      None => break,
    }
  }

  print_session_summary(&attempts);
}

/// Run a single problem to its final outcome: correct, answer revealed
/// after repeated errors, or skipped. Returns None if the user quit.
fn run_problem(pool: &DbPool, user_id: &str, problem: Problem) -> Option<AttemptRecord> {
  let mut errors: i64 = 0;
  let started = Instant::now();

  loop {
    let answer = read_line(&format!("{} + {} =", problem.operand1, problem.operand2));

    if answer == "q" || answer == "quit" {
      return None;
    }
    if answer.is_empty() {
      // Skip: recorded as an incorrect attempt with no answer
      println!("Skipped. The answer was {}.", problem.answer());
      return record_outcome(pool, user_id, problem, None, false, &started, errors);
    }

    let Ok(parsed) = answer.parse::<i64>() else {
      println!("Please enter a number (or press Enter to skip)");
      continue;
    };

    if parsed == problem.answer() {
      println!("Correct!");
      return record_outcome(pool, user_id, problem, Some(parsed), true, &started, errors);
    }

    errors += 1;
    if errors >= config::MAX_ERRORS_PER_PROBLEM {
      println!("The answer was {}.", problem.answer());
      // Final wrong submission is the recorded outcome; earlier ones are
      // the in-session error count
      return record_outcome(pool, user_id, problem, Some(parsed), false, &started, errors - 1);
    }
    println!("Not quite, try again");
  }
}

fn record_outcome(
  pool: &DbPool,
  user_id: &str,
  problem: Problem,
  user_answer: Option<i64>,
  is_correct: bool,
  started: &Instant,
  errors: i64,
) -> Option<AttemptRecord> {
  let response_time_ms = (started.elapsed().as_millis() as i64).max(1);
  let input = AttemptInput {
    user_id: user_id.to_string(),
    fact_key: problem.fact_key(),
    operand1: problem.operand1,
    operand2: problem.operand2,
    user_answer,
    correct_answer: problem.answer(),
    is_correct,
    response_time_ms,
    incorrect_attempts_in_session: errors,
  };

  // A conflicted cycle is safe to rerun from scratch
  for _ in 0..3 {
    let now = Utc::now();
    match tracker::record_attempt(pool, &input, now) {
      Ok(state) => {
        return Some(AttemptRecord {
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
          grade: state.last_grade.unwrap_or(0),
          attempted_at: now,
        });
      }
      Err(TrackerError::Conflict) => {
        tracing::warn!("Conflict recording {}, retrying", input.fact_key);
        continue;
      }
      Err(e) => {
        println!("Could not record attempt: {}", e);
        return None;
      }
    }
  }
  println!("Could not record attempt after repeated conflicts");
  None
}

fn print_session_summary(attempts: &[AttemptRecord]) {
  if attempts.is_empty() {
    return;
  }
  let summary = summarize_session(attempts);

  println!();
  println!("Session complete!");
  println!(
    "  {}/{} correct ({:.0}%)",
    summary.correct_attempts, summary.total_attempts, summary.accuracy
  );
  println!(
    "  Response time: {:.1}s mean, {:.1}s median",
    summary.mean_response_ms / 1000.0,
    summary.median_response_ms / 1000.0
  );
  if !summary.weak_facts.is_empty() {
    println!("  Needs practice: {}", summary.weak_facts.join(", "));
  }
}

fn show_progress(pool: &DbPool, user_id: &str) {
  let now = Utc::now();
  let Some(summary) = tracker::get_user_summary(pool, user_id, now).log_warn("Failed to load summary")
  else {
    println!("Progress is unavailable right now");
    return;
  };

  println!();
  println!("Facts tracked: {}", summary.total_facts);
  println!("Due for review: {}", summary.facts_due);
  println!(
    "Attempts: {} ({} correct)",
    summary.total_attempts, summary.correct_attempts
  );
  println!("Average accuracy: {:.0}%", summary.average_accuracy);
  println!("Average ease factor: {:.2}", summary.average_ease_factor);

  let weak = tracker::get_weak_facts(pool, user_id, now, config::WEAK_FACTS_LIMIT)
    .log_warn_default("Failed to load weak facts");
  if !weak.is_empty() {
    println!();
    println!("Focus facts:");
    for fact in weak {
      println!(
        "  {:>7}  {:>5.0}% accurate, ease {:.2}, {}",
        fact.fact_key,
        fact.accuracy(),
        fact.ease_factor,
        fact.mastery().as_str()
      );
    }
  }
}

fn read_line(prompt: &str) -> String {
  print!("{} ", prompt);
  let _ = io::stdout().flush();
  let mut line = String::new();
  if io::stdin().read_line(&mut line).is_err() {
    return String::new();
  }
  line.trim().to_string()
}

fn read_number(prompt: &str, default: i64) -> i64 {
  loop {
    let input = read_line(&format!("{} (default {}):", prompt, default));
    if input.is_empty() {
      return default;
    }
    match input.parse() {
      Ok(n) => return n,
      Err(_) => println!("Please enter a valid number"),
    }
  }
}

fn read_difficulty(prompt: &str, default: Difficulty) -> Difficulty {
  loop {
    let n = read_number(prompt, default.level() as i64);
    match u8::try_from(n).ok().and_then(Difficulty::from_level) {
      Some(d) => return d,
      None => println!("Please enter a level between 1 and 5"),
    }
  }
}
