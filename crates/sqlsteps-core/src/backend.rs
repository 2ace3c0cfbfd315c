//! Per-dialect database primitives used by the [`Migrator`](crate::Migrator).
//!
//! A backend wraps a caller-supplied open connection. It never pools,
//! retries or reopens that connection, and it performs no inter-process
//! locking: running two migrators against one database at the same time can
//! race on table creation and on the gap between [`Backend::is_applied`] and
//! the commit in [`Backend::apply`]. Callers that may run concurrently must
//! serialize runs themselves (e.g. with an advisory lock held for the run).

use std::fmt;

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::migration::Migration;

/// Names of the bookkeeping table and its three columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub schema: Option<String>,
    pub table: String,
    pub id_column: String,
    pub description_column: String,
    pub timestamp_column: String,
}

impl TableDefinition {
    pub fn new(
        table: impl Into<String>,
        id_column: impl Into<String>,
        description_column: impl Into<String>,
        timestamp_column: impl Into<String>,
    ) -> Self {
        Self {
            schema: None,
            table: table.into(),
            id_column: id_column.into(),
            description_column: description_column.into(),
            timestamp_column: timestamp_column.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Compare live column names against the expected ones (case-insensitive).
    pub fn status_from_columns<I, S>(&self, columns: I) -> TableStatus
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<String> = columns
            .into_iter()
            .map(|c| c.as_ref().to_lowercase())
            .collect();
        let has = |name: &str| columns.iter().any(|c| *c == name.to_lowercase());

        TableStatus {
            is_present: !columns.is_empty(),
            has_correct_columns: has(&self.id_column)
                && has(&self.description_column)
                && has(&self.timestamp_column),
        }
    }
}

impl fmt::Display for TableDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Live state of the bookkeeping table, recomputed on every run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStatus {
    pub is_present: bool,
    pub has_correct_columns: bool,
}

/// Database primitives the migrator drives.
///
/// Implementations must make [`Backend::apply`] atomic: either every command
/// of the migration plus its bookkeeping row is committed, or nothing is.
pub trait Backend {
    fn table_definition(&self) -> &TableDefinition;

    /// Inspect schema metadata for the bookkeeping table.
    fn describe_table(&mut self) -> Result<TableStatus>;

    /// Create the bookkeeping table and a unique index on the id column in
    /// one transaction.
    fn create_table(&mut self) -> Result<()>;

    /// One round trip per id. Migrations may insert bookkeeping rows for
    /// later ids themselves, so this must not be answered from a cache.
    fn is_applied(&mut self, id: i64) -> Result<bool>;

    /// Run every command of `migration` and record it, in one transaction.
    /// `cancel` is checked before each command.
    fn apply(&mut self, migration: &Migration, cancel: &CancelFlag) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn table_definition(&self) -> &TableDefinition {
        (**self).table_definition()
    }

    fn describe_table(&mut self) -> Result<TableStatus> {
        (**self).describe_table()
    }

    fn create_table(&mut self) -> Result<()> {
        (**self).create_table()
    }

    fn is_applied(&mut self, id: i64) -> Result<bool> {
        (**self).is_applied(id)
    }

    fn apply(&mut self, migration: &Migration, cancel: &CancelFlag) -> Result<()> {
        (**self).apply(migration, cancel)
    }
}
