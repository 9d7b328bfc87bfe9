//! Addition problem generation across five difficulty levels.

use rand::Rng;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Difficulty {
  SingleDigit,
  TwoDigitNoCarry,
  TwoDigitCarry,
  ThreeDigitNoCarry,
  ThreeDigitCarry,
}

impl Difficulty {
  pub fn from_level(level: u8) -> Option<Self> {
    match level {
      1 => Some(Self::SingleDigit),
      2 => Some(Self::TwoDigitNoCarry),
      3 => Some(Self::TwoDigitCarry),
      4 => Some(Self::ThreeDigitNoCarry),
      5 => Some(Self::ThreeDigitCarry),
      _ => None,
    }
  }

  pub fn level(&self) -> u8 {
    match self {
      Self::SingleDigit => 1,
      Self::TwoDigitNoCarry => 2,
      Self::TwoDigitCarry => 3,
      Self::ThreeDigitNoCarry => 4,
      Self::ThreeDigitCarry => 5,
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      Self::SingleDigit => "Two single-digit numbers",
      Self::TwoDigitNoCarry => "Two two-digit numbers, no carrying",
      Self::TwoDigitCarry => "Two two-digit numbers with carrying",
      Self::ThreeDigitNoCarry => "Two three-digit numbers, no carrying",
      Self::ThreeDigitCarry => "Two three-digit numbers with carrying",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Problem {
  pub operand1: i64,
  pub operand2: i64,
}

impl Problem {
  pub fn answer(&self) -> i64 {
    self.operand1 + self.operand2
  }

  /// Fact identity. Operand order is preserved: "8+3" and "3+8" are
  /// tracked separately.
  pub fn fact_key(&self) -> String {
    format!("{}+{}", self.operand1, self.operand2)
  }

  pub fn from_fact_key(key: &str) -> Option<Self> {
    let (a, b) = key.split_once('+')?;
    Some(Self {
      operand1: a.trim().parse().ok()?,
      operand2: b.trim().parse().ok()?,
    })
  }
}

/// Generates problems on demand, picking a random difficulty from an
/// inclusive range per problem.
pub struct ProblemGenerator {
  low: Difficulty,
  high: Difficulty,
}

impl ProblemGenerator {
  pub fn new(low: Difficulty, high: Difficulty) -> Result<Self, TrackerError> {
    if high < low {
      return Err(TrackerError::Validation(format!(
        "difficulty range inverted: {}-{}",
        low.level(),
        high.level()
      )));
    }
    Ok(Self { low, high })
  }

  pub fn next_problem(&self, rng: &mut impl Rng) -> Problem {
    let level = rng.random_range(self.low.level()..=self.high.level());
    let difficulty = Difficulty::from_level(level).unwrap_or(Difficulty::SingleDigit);
    generate_problem(difficulty, rng)
  }
}

pub fn generate_problem(difficulty: Difficulty, rng: &mut impl Rng) -> Problem {
  let (operand1, operand2) = match difficulty {
    Difficulty::SingleDigit => (rng.random_range(0..=9), rng.random_range(0..=9)),
    Difficulty::TwoDigitNoCarry => digits_no_carry(rng, 10, 99),
    Difficulty::TwoDigitCarry => digits_with_carry(rng, 10, 99),
    Difficulty::ThreeDigitNoCarry => digits_no_carry(rng, 100, 999),
    Difficulty::ThreeDigitCarry => digits_with_carry(rng, 100, 999),
  };
  Problem { operand1, operand2 }
}

/// Rejection-sample a pair where no digit column carries.
fn digits_no_carry(rng: &mut impl Rng, min: i64, max: i64) -> (i64, i64) {
  loop {
    let a = rng.random_range(min..=max);
    let b = rng.random_range(min..=max);
    if no_column_carries(a, b) {
      return (a, b);
    }
  }
}

/// Rejection-sample a pair where at least the ones column carries.
fn digits_with_carry(rng: &mut impl Rng, min: i64, max: i64) -> (i64, i64) {
  loop {
    let a = rng.random_range(min..=max);
    let b = rng.random_range(min..=max);
    if a % 10 + b % 10 > 9 {
      return (a, b);
    }
  }
}

fn no_column_carries(a: i64, b: i64) -> bool {
  let (mut a, mut b) = (a, b);
  while a > 0 || b > 0 {
    if a % 10 + b % 10 > 9 {
      return false;
    }
    a /= 10;
    b /= 10;
  }
  true
}
