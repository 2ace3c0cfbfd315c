use thiserror::Error;

use crate::migration::Migration;

/// Boxed driver error carried as the source of backend failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while collecting or applying migrations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The candidate set was rejected before touching the database.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The bookkeeping table exists but lacks one of the expected columns.
    #[error("Migration table '{table}' does not have the required schema")]
    Schema { table: String },

    /// A DDL statement failed while creating the bookkeeping table.
    #[error("Error creating migration table '{table}' while running: {command}")]
    CreateTable {
        table: String,
        command: String,
        #[source]
        source: BoxError,
    },

    /// A migration command, or its bookkeeping insert (`command == None`),
    /// failed. The migration's transaction has been rolled back.
    #[error("Error applying migration {}{}", .migration.id, failing_command(.command))]
    Apply {
        migration: Box<Migration>,
        command: Option<String>,
        #[source]
        source: BoxError,
    },

    /// The run was cancelled before migration `id` could commit.
    #[error("Migration run cancelled at migration {id}")]
    Cancelled { id: i64 },

    /// Introspection or lookup query failure.
    #[error("Database error: {0}")]
    Backend(#[source] BoxError),

    /// Reading a script or enumerating a source failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No migrations available")]
    NoMigrations,

    #[error("Duplicate migration id {0}")]
    DuplicateId(i64),

    #[error("Migration ids are not contiguous: expected {expected}, found {found}")]
    NotContiguous { expected: i64, found: i64 },
}

impl MigrateError {
    /// Wrap a driver error that occurred outside of a migration transaction.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MigrateError::Backend(Box::new(err))
    }

    /// The migration a failure belongs to, if any.
    pub fn migration(&self) -> Option<&Migration> {
        match self {
            MigrateError::Apply { migration, .. } => Some(migration),
            _ => None,
        }
    }

    /// The SQL text that failed, if the failure is tied to one statement.
    pub fn command(&self) -> Option<&str> {
        match self {
            MigrateError::CreateTable { command, .. } => Some(command),
            MigrateError::Apply { command, .. } => command.as_deref(),
            _ => None,
        }
    }
}

fn failing_command(command: &Option<String>) -> String {
    match command {
        Some(cmd) => format!(" while running: {cmd}"),
        None => " while updating the migration table".to_string(),
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MigrateError>;
