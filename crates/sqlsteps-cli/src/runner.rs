//! Wires a [`RunConfig`] to a source, a backend and the migrator.

use anyhow::Context;
use sqlsteps_core::{
    ArchiveSource, BatchSeparatorParser, CancelFlag, DirectorySource, LineDelimitedParser,
    MigrationReport, MigrationSource, Migrator, MigratorOptions, ParserRegistry,
    SemicolonDelimitedParser, TableDefinition,
};
use sqlsteps_postgres::PostgresBackend;
use sqlsteps_sqlite::SqliteBackend;

use crate::config::{DatabaseTarget, ParseMode, RunConfig};

/// One parser for the configured extension, picked by mode.
pub fn parsers(config: &RunConfig) -> ParserRegistry {
    let mut parsers = ParserRegistry::new();
    match config.mode {
        ParseMode::Line => parsers.register_extension(&config.extension, LineDelimitedParser),
        ParseMode::Semicolon => {
            parsers.register_extension(&config.extension, SemicolonDelimitedParser)
        }
        ParseMode::Batch => parsers.register_extension(
            &config.extension,
            BatchSeparatorParser::with_separator(config.separator.as_str()),
        ),
    };
    parsers
}

/// Apply the configured table and schema overrides to a backend default.
pub fn table_definition(config: &RunConfig, default: TableDefinition) -> TableDefinition {
    let mut table = default;
    if let Some(name) = &config.table {
        table = table.with_table(name.as_str());
    }
    if let Some(schema) = &config.schema {
        table = table.with_schema(schema.as_str());
    }
    table
}

/// A `.zip` migrations path is read as an archive, anything else as a
/// directory.
pub fn source(config: &RunConfig) -> Box<dyn MigrationSource + Send + Sync> {
    let path = &config.migrations_dir;
    let is_archive = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));

    if is_archive {
        Box::new(ArchiveSource::new(path, parsers(config)))
    } else {
        Box::new(DirectorySource::new(path, parsers(config)))
    }
}

/// Open the configured database and run every migration from the source.
///
/// Blocks the calling thread for the whole run.
pub fn run(config: &RunConfig, cancel: CancelFlag) -> anyhow::Result<MigrationReport> {
    let source = source(config);
    let migrator = Migrator::with_options(MigratorOptions {
        require_contiguous_ids: config.require_contiguous_ids,
    })
    .with_cancel_flag(cancel);

    let report = match config.target() {
        DatabaseTarget::Sqlite(path) => {
            let mut conn = rusqlite::Connection::open(&path)
                .with_context(|| format!("failed to open SQLite database {}", path.display()))?;
            let table = table_definition(config, SqliteBackend::default_table());
            let mut backend = SqliteBackend::with_table(&mut conn, table);
            migrator.apply_source(&mut backend, source.as_ref())?
        }
        DatabaseTarget::Postgres(url) => {
            let mut client = postgres::Client::connect(&url, postgres::NoTls)
                .context("failed to connect to PostgreSQL")?;
            let table = table_definition(config, PostgresBackend::default_table());
            let mut backend = PostgresBackend::with_table(&mut client, table);
            migrator.apply_source(&mut backend, source.as_ref())?
        }
    };

    Ok(report)
}

/// Run on tokio's blocking pool; raising `cancel` stops the run at the next
/// command boundary.
pub async fn run_blocking(
    config: RunConfig,
    cancel: CancelFlag,
) -> anyhow::Result<MigrationReport> {
    tokio::task::spawn_blocking(move || run(&config, cancel))
        .await
        .context("migration task panicked")?
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_scripts(dir: &std::path::Path) {
        fs::write(
            dir.join("001_users.sql"),
            "-- id: 1\n-- description: users\nCREATE TABLE users (id INTEGER);\n",
        )
        .unwrap();
        fs::write(
            dir.join("002_posts.sql"),
            "-- id: 2\nCREATE TABLE posts (id INTEGER);\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "-- id: 9\nnot a migration;\n").unwrap();
    }

    fn sqlite_config(dir: &tempfile::TempDir) -> RunConfig {
        let scripts = dir.path().join("migrations");
        fs::create_dir(&scripts).unwrap();
        write_scripts(&scripts);

        RunConfig {
            database: dir.path().join("app.db").to_string_lossy().into_owned(),
            migrations_dir: scripts,
            ..RunConfig::default()
        }
    }

    #[test]
    fn overrides_apply_to_default_table() {
        let config = RunConfig {
            table: Some("schema_log".into()),
            schema: Some("meta".into()),
            ..RunConfig::default()
        };
        let table = table_definition(&config, SqliteBackend::default_table());
        assert_eq!(table.to_string(), "meta.schema_log");
        assert_eq!(table.id_column, "Version");
    }

    #[test]
    fn batch_mode_uses_configured_separator() {
        let config = RunConfig {
            mode: ParseMode::Batch,
            separator: "END".into(),
            ..RunConfig::default()
        };
        let migrations = parsers(&config)
            .parse_named("a.SQL", || {
                Ok::<_, std::io::Error>("-- id: 4\nSELECT 1\nEND\n".as_bytes())
            })
            .unwrap();
        assert_eq!(migrations[0].commands, vec!["SELECT 1"]);
    }

    #[tokio::test]
    async fn runs_directory_against_sqlite_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = sqlite_config(&dir);

        let report = run_blocking(config.clone(), CancelFlag::new()).await.unwrap();
        assert!(report.table_created);
        assert_eq!(report.applied, vec![1, 2]);

        let report = run_blocking(config, CancelFlag::new()).await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped, vec![1, 2]);
    }

    #[tokio::test]
    async fn runs_zip_archive_against_sqlite_file() {
        use std::io::Write;
        use zip::write::FileOptions;

        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("release.ZIP");
        let mut writer = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
        writer
            .start_file("db/001_users.sql", FileOptions::default())
            .unwrap();
        writer
            .write_all(b"-- id: 1\nCREATE TABLE users (id INTEGER);\n")
            .unwrap();
        writer.finish().unwrap();

        let config = RunConfig {
            database: dir.path().join("app.db").to_string_lossy().into_owned(),
            migrations_dir: archive,
            ..RunConfig::default()
        };

        let report = run_blocking(config, CancelFlag::new()).await.unwrap();
        assert_eq!(report.applied, vec![1]);
    }

    #[tokio::test]
    async fn cancelled_run_reports_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = sqlite_config(&dir);

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = run_blocking(config, cancel).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<sqlsteps_core::MigrateError>(),
            Some(sqlsteps_core::MigrateError::Cancelled { id: 1 })
        ));
    }

    #[tokio::test]
    async fn empty_directory_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            database: dir.path().join("app.db").to_string_lossy().into_owned(),
            migrations_dir: dir.path().to_path_buf(),
            ..RunConfig::default()
        };

        let err = run_blocking(config, CancelFlag::new()).await.unwrap_err();
        assert!(err.to_string().contains("No migrations available"));
    }
}
