//! # sqlsteps-sqlite
//!
//! SQLite backend for `sqlsteps`. Wraps a caller-owned
//! `rusqlite::Connection`; the bookkeeping table defaults to
//! `VersionInfo(Version, Description, AppliedOn)`.

mod backend;

use rusqlite::Connection;
use sqlsteps_core::{MigrationReport, MigrationSource, Migrator, Result};

pub use backend::SqliteBackend;

/// Apply every migration from `source` to `conn` using the default
/// bookkeeping table and migrator settings.
pub fn run_migrations<S>(conn: &mut Connection, source: &S) -> Result<MigrationReport>
where
    S: MigrationSource + ?Sized,
{
    let mut backend = SqliteBackend::new(conn);
    Migrator::new().apply_source(&mut backend, source)
}
