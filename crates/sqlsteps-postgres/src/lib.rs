//! # sqlsteps-postgres
//!
//! PostgreSQL backend for `sqlsteps`. Wraps a caller-owned blocking
//! `postgres::Client`; the bookkeeping table defaults to
//! `public.version_info(version, description, applied_on)`.

mod backend;

use postgres::Client;
use sqlsteps_core::{MigrationReport, MigrationSource, Migrator, Result};

pub use backend::PostgresBackend;

/// Apply every migration from `source` through `client` using the default
/// bookkeeping table and migrator settings.
pub fn run_migrations<S>(client: &mut Client, source: &S) -> Result<MigrationReport>
where
    S: MigrationSource + ?Sized,
{
    let mut backend = PostgresBackend::new(client);
    Migrator::new().apply_source(&mut backend, source)
}
