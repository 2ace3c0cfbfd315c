//! The migration engine.
//!
//! [`Migrator::apply_all`] sorts and validates the candidates, makes sure the
//! bookkeeping table exists with the expected columns, and then applies every
//! migration that is not yet recorded, one transaction per migration, in
//! ascending id order. The first failure stops the run; migrations committed
//! before it stay applied, so re-running after a fix resumes where it left.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::backend::Backend;
use crate::cancel::CancelFlag;
use crate::error::{MigrateError, Result, ValidationError};
use crate::migration::{Migration, MigrationReport};
use crate::source::MigrationSource;

#[derive(Debug, Clone, Default)]
pub struct MigratorOptions {
    /// Require the enabled ids to be exactly `1..=N`. Off by default, which
    /// allows gaps so new migrations can be slotted in between releases.
    pub require_contiguous_ids: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Migrator {
    options: MigratorOptions,
    cancel: CancelFlag,
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MigratorOptions) -> Self {
        Self {
            options,
            cancel: CancelFlag::new(),
        }
    }

    /// Share `cancel` with the caller; raising it stops the run at the next
    /// command and rolls back the open migration.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Load every migration from `source` and apply them.
    pub fn apply_source<B, S>(&self, backend: &mut B, source: &S) -> Result<MigrationReport>
    where
        B: Backend + ?Sized,
        S: MigrationSource + ?Sized,
    {
        let candidates = source.migrations()?;
        self.apply_all(backend, candidates)
    }

    /// Order, filter and validate `candidates` without touching a database.
    ///
    /// Disabled migrations are dropped wherever they appear; enabled ones
    /// after a disabled id still run.
    pub fn plan(&self, mut candidates: Vec<Migration>) -> Result<Vec<Migration>> {
        candidates.sort_by_key(|m| m.id);
        candidates.retain(|m| m.enabled);

        if candidates.is_empty() {
            return Err(ValidationError::NoMigrations.into());
        }

        let mut seen = HashSet::with_capacity(candidates.len());
        for migration in &candidates {
            if !seen.insert(migration.id) {
                return Err(ValidationError::DuplicateId(migration.id).into());
            }
        }

        if self.options.require_contiguous_ids {
            for (expected, migration) in (1i64..).zip(&candidates) {
                if migration.id != expected {
                    return Err(ValidationError::NotContiguous {
                        expected,
                        found: migration.id,
                    }
                    .into());
                }
            }
        }

        Ok(candidates)
    }

    /// Apply every candidate that is not yet recorded in the bookkeeping table.
    pub fn apply_all<B>(&self, backend: &mut B, candidates: Vec<Migration>) -> Result<MigrationReport>
    where
        B: Backend + ?Sized,
    {
        let migrations = self.plan(candidates)?;
        let table = backend.table_definition().to_string();
        let mut report = MigrationReport::default();

        let status = backend.describe_table()?;
        if !status.is_present {
            info!(%table, "creating migration table");
            backend.create_table()?;
            report.table_created = true;
        } else if !status.has_correct_columns {
            return Err(MigrateError::Schema { table });
        }

        info!(
            %table,
            candidates = migrations.len(),
            "checking database migrations"
        );

        for migration in &migrations {
            if self.cancel.is_cancelled() {
                return Err(MigrateError::Cancelled { id: migration.id });
            }

            if backend.is_applied(migration.id)? {
                debug!(id = migration.id, "migration already applied, skipping");
                report.skipped.push(migration.id);
                continue;
            }

            info!(
                id = migration.id,
                description = migration.description.as_deref().unwrap_or(""),
                commands = migration.commands.len(),
                "applying migration"
            );
            backend.apply(migration, &self.cancel)?;
            report.applied.push(migration.id);
        }

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "migrations complete"
        );

        Ok(report)
    }
}
