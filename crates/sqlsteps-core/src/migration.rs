//! The migration entity produced by parsers and consumed by the migrator.

use serde::Serialize;

/// One versioned unit of work: an ordered list of SQL commands applied in a
/// single transaction and recorded under `id` in the bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Externally assigned identifier (`-- id:` directive).
    pub id: i64,
    /// Optional free text stored alongside the bookkeeping row.
    pub description: Option<String>,
    /// Disabled migrations are filtered out before validation.
    pub enabled: bool,
    /// Opaque SQL statements, executed in order. May be empty.
    pub commands: Vec<String>,
}

impl Migration {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Default for Migration {
    fn default() -> Self {
        Self {
            id: 0,
            description: None,
            enabled: true,
            commands: Vec::new(),
        }
    }
}

/// Outcome of a successful [`Migrator::apply_all`](crate::Migrator::apply_all) run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Whether the bookkeeping table had to be created by this run.
    pub table_created: bool,
    /// Ids applied by this run, in application order.
    pub applied: Vec<i64>,
    /// Ids found already recorded and therefore skipped.
    pub skipped: Vec<i64>,
}
