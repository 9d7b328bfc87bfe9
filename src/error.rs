use std::fmt;

/// Errors surfaced by the attempt-tracking pipeline.
#[derive(Debug)]
pub enum TrackerError {
  /// Input rejected before any state was touched
  Validation(String),
  /// A competing writer held the database; retry the whole read-compute-write cycle
  Conflict,
  /// Database mutex poisoned by a panicking thread
  Lock,
  Db(rusqlite::Error),
}

impl fmt::Display for TrackerError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Validation(msg) => write!(f, "Invalid input: {}", msg),
      Self::Conflict => write!(f, "Concurrent update detected, retry the attempt"),
      Self::Lock => write!(f, "Database unavailable"),
      Self::Db(e) => write!(f, "Database error: {}", e),
    }
  }
}

impl std::error::Error for TrackerError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Db(e) => Some(e),
      _ => None,
    }
  }
}

impl From<rusqlite::Error> for TrackerError {
  fn from(e: rusqlite::Error) -> Self {
    use rusqlite::ErrorCode;
    match e.sqlite_error_code() {
      Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => Self::Conflict,
      _ => Self::Db(e),
    }
  }
}
