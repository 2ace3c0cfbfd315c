//! SQLite implementation of [`Backend`].
//!
//! The bookkeeping table is introspected through `pragma_table_info` and the
//! applied-on timestamp is stored as ISO-8601 text in UTC.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use sqlsteps_core::{
    Backend, CancelFlag, MigrateError, Migration, Result, TableDefinition, TableStatus,
};

/// Timestamp layout written to the applied-on column.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Drives migrations over a borrowed [`rusqlite::Connection`].
pub struct SqliteBackend<'c> {
    conn: &'c mut Connection,
    table: TableDefinition,
}

impl<'c> SqliteBackend<'c> {
    /// Use the default `VersionInfo` bookkeeping table.
    pub fn new(conn: &'c mut Connection) -> Self {
        Self::with_table(conn, Self::default_table())
    }

    pub fn with_table(conn: &'c mut Connection, table: TableDefinition) -> Self {
        Self { conn, table }
    }

    pub fn default_table() -> TableDefinition {
        TableDefinition::new("VersionInfo", "Version", "Description", "AppliedOn")
    }

    /// Return a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &*self.conn
    }

    fn qualified_table(&self) -> String {
        match &self.table.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&self.table.table)),
            None => quote(&self.table.table),
        }
    }

    fn index_name(&self) -> String {
        let index = format!("UC_{}", self.table.table);
        match &self.table.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&index)),
            None => quote(&index),
        }
    }

    fn create_table_statements(&self) -> [String; 2] {
        let t = &self.table;
        [
            format!(
                "CREATE TABLE {} ({} INTEGER NOT NULL, {} TEXT, {} TEXT NOT NULL);",
                self.qualified_table(),
                quote(&t.id_column),
                quote(&t.description_column),
                quote(&t.timestamp_column),
            ),
            format!(
                "CREATE UNIQUE INDEX {} ON {} ({} ASC);",
                self.index_name(),
                quote(&t.table),
                quote(&t.id_column),
            ),
        ]
    }

    fn insert_statement(&self) -> String {
        let t = &self.table;
        format!(
            "INSERT INTO {} ({}, {}, {}) VALUES (?1, ?2, ?3);",
            self.qualified_table(),
            quote(&t.id_column),
            quote(&t.description_column),
            quote(&t.timestamp_column),
        )
    }
}

impl Backend for SqliteBackend<'_> {
    fn table_definition(&self) -> &TableDefinition {
        &self.table
    }

    fn describe_table(&mut self) -> Result<TableStatus> {
        let columns = match &self.table.schema {
            Some(schema) => query_columns(
                &*self.conn,
                "SELECT name FROM pragma_table_info(?1, ?2)",
                params![self.table.table, schema],
            ),
            None => query_columns(
                &*self.conn,
                "SELECT name FROM pragma_table_info(?1)",
                params![self.table.table],
            ),
        }
        .map_err(MigrateError::backend)?;

        Ok(self.table.status_from_columns(columns))
    }

    fn create_table(&mut self) -> Result<()> {
        let table = self.table.to_string();
        let statements = self.create_table_statements();

        let tx = self.conn.transaction().map_err(MigrateError::backend)?;
        for command in statements {
            if let Err(e) = tx.execute_batch(&command) {
                let _ = tx.rollback();
                return Err(MigrateError::CreateTable {
                    table,
                    command,
                    source: Box::new(e),
                });
            }
        }
        tx.commit().map_err(MigrateError::backend)?;

        tracing::debug!(%table, "migration table created");
        Ok(())
    }

    fn is_applied(&mut self, id: i64) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1;",
            self.qualified_table(),
            quote(&self.table.id_column),
        );
        let found = self
            .conn
            .query_row(&sql, params![id], |_| Ok(()))
            .optional()
            .map_err(MigrateError::backend)?;
        Ok(found.is_some())
    }

    fn apply(&mut self, migration: &Migration, cancel: &CancelFlag) -> Result<()> {
        let insert = self.insert_statement();
        let applied_on = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        // Dropping `tx` on any early return rolls the migration back.
        let tx = self.conn.transaction().map_err(MigrateError::backend)?;

        for command in &migration.commands {
            if cancel.is_cancelled() {
                tx.rollback().map_err(MigrateError::backend)?;
                return Err(MigrateError::Cancelled { id: migration.id });
            }

            if let Err(e) = tx.execute_batch(command) {
                let _ = tx.rollback();
                return Err(apply_error(migration, Some(command), e));
            }
        }

        let recorded = tx.execute(
            &insert,
            params![migration.id, migration.description, applied_on],
        );
        if let Err(e) = recorded {
            let _ = tx.rollback();
            return Err(apply_error(migration, None, e));
        }

        tx.commit().map_err(|e| apply_error(migration, None, e))
    }
}

fn query_columns(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

    let mut columns = Vec::new();
    for row in rows {
        columns.push(row?);
    }
    Ok(columns)
}

fn apply_error(
    migration: &Migration,
    command: Option<&String>,
    err: rusqlite::Error,
) -> MigrateError {
    MigrateError::Apply {
        migration: Box::new(migration.clone()),
        command: command.cloned(),
        source: Box::new(err),
    }
}

/// Double-quote an identifier, escaping embedded quotes.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
