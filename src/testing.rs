//! Test utilities for database setup.
//!
//! Reuses the authoritative schema initialization so tests never carry a
//! duplicate copy of the schema.

use tempfile::TempDir;

use crate::db::{self, DbPool};

/// File-backed test database in a temporary directory, initialized through
/// the production `init_db` path and cleaned up on drop.
pub struct TestEnv {
    /// Kept alive so the database file persists for the test's duration
    pub temp: TempDir,
    pub pool: DbPool,
}

impl TestEnv {
    pub fn new() -> rusqlite::Result<Self> {
        let temp =
            TempDir::new().map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        let pool = db::init_db(&temp.path().join("mathfacts.db"))?;
        Ok(Self { temp, pool })
    }
}
