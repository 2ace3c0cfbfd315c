//! PostgreSQL implementation of [`Backend`].

use chrono::Utc;
use postgres::Client;
use sqlsteps_core::{
    Backend, CancelFlag, MigrateError, Migration, Result, TableDefinition, TableStatus,
};

const DESCRIBE_COLUMNS: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_name = $1 AND table_schema = COALESCE($2::text, current_schema()::text)";

/// Drives migrations over a borrowed [`postgres::Client`].
pub struct PostgresBackend<'c> {
    client: &'c mut Client,
    table: TableDefinition,
}

impl<'c> PostgresBackend<'c> {
    /// Use the default `public.version_info` bookkeeping table.
    pub fn new(client: &'c mut Client) -> Self {
        Self::with_table(client, Self::default_table())
    }

    pub fn with_table(client: &'c mut Client, table: TableDefinition) -> Self {
        Self { client, table }
    }

    pub fn default_table() -> TableDefinition {
        TableDefinition::new("version_info", "version", "description", "applied_on")
            .with_schema("public")
    }

    fn qualified_table(&self) -> String {
        qualified(&self.table)
    }

    fn create_table_statements(&self) -> [String; 2] {
        create_table_statements(&self.table)
    }

    fn insert_statement(&self) -> String {
        let t = &self.table;
        format!(
            "INSERT INTO {} ({}, {}, {}) VALUES ($1, $2, $3)",
            self.qualified_table(),
            quote(&t.id_column),
            quote(&t.description_column),
            quote(&t.timestamp_column),
        )
    }
}

impl Backend for PostgresBackend<'_> {
    fn table_definition(&self) -> &TableDefinition {
        &self.table
    }

    fn describe_table(&mut self) -> Result<TableStatus> {
        let rows = self
            .client
            .query(DESCRIBE_COLUMNS, &[&self.table.table, &self.table.schema])
            .map_err(MigrateError::backend)?;

        let columns = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(MigrateError::backend)?;

        Ok(self.table.status_from_columns(columns))
    }

    fn create_table(&mut self) -> Result<()> {
        let table = self.table.to_string();
        let statements = self.create_table_statements();

        let mut tx = self.client.transaction().map_err(MigrateError::backend)?;
        for command in statements {
            if let Err(e) = tx.batch_execute(&command) {
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
            "SELECT 1 FROM {} WHERE {} = $1 LIMIT 1",
            self.qualified_table(),
            quote(&self.table.id_column),
        );
        let found = self
            .client
            .query_opt(sql.as_str(), &[&id])
            .map_err(MigrateError::backend)?;
        Ok(found.is_some())
    }

    fn apply(&mut self, migration: &Migration, cancel: &CancelFlag) -> Result<()> {
        let insert = self.insert_statement();
        let applied_on = Utc::now().naive_utc();

        // Dropping `tx` on any early return rolls the migration back.
        let mut tx = self.client.transaction().map_err(MigrateError::backend)?;

        for command in &migration.commands {
            if cancel.is_cancelled() {
                tx.rollback().map_err(MigrateError::backend)?;
                return Err(MigrateError::Cancelled { id: migration.id });
            }

            if let Err(e) = tx.batch_execute(command) {
                let _ = tx.rollback();
                return Err(apply_error(migration, Some(command), e));
            }
        }

        let recorded = tx.execute(
            insert.as_str(),
            &[&migration.id, &migration.description, &applied_on],
        );
        if let Err(e) = recorded {
            let _ = tx.rollback();
            return Err(apply_error(migration, None, e));
        }

        tx.commit().map_err(|e| apply_error(migration, None, e))
    }
}

fn qualified(table: &TableDefinition) -> String {
    match &table.schema {
        Some(schema) => format!("{}.{}", quote(schema), quote(&table.table)),
        None => quote(&table.table),
    }
}

fn create_table_statements(table: &TableDefinition) -> [String; 2] {
    [
        format!(
            "CREATE TABLE {} ({} BIGINT NOT NULL, {} TEXT, {} TIMESTAMP NOT NULL)",
            qualified(table),
            quote(&table.id_column),
            quote(&table.description_column),
            quote(&table.timestamp_column),
        ),
        // Postgres places the index in the table's schema; the name itself
        // cannot be qualified.
        format!(
            "CREATE UNIQUE INDEX {} ON {} USING btree ({})",
            quote(&format!("{}_{}_idx", table.table, table.id_column)),
            qualified(table),
            quote(&table.id_column),
        ),
    ]
}

fn apply_error(
    migration: &Migration,
    command: Option<&String>,
    err: postgres::Error,
) -> MigrateError {
    MigrateError::Apply {
        migration: Box::new(migration.clone()),
        command: command.cloned(),
        source: Box::new(err),
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
