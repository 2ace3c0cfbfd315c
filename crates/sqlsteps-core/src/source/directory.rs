use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{sort_by_id, MigrationSource, ParserRegistry};
use crate::error::Result;
use crate::migration::Migration;

/// Reads migration scripts from the files of one directory (not recursive).
///
/// Registered predicates are matched against each file's full path.
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    parsers: ParserRegistry,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, parsers: ParserRegistry) -> Self {
        Self {
            dir: dir.into(),
            parsers,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MigrationSource for DirectorySource {
    fn migrations(&self) -> Result<Vec<Migration>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();

        let mut migrations = Vec::new();
        for path in &files {
            let name = path.to_string_lossy();
            let parsed = self
                .parsers
                .parse_named(&name, || File::open(path).map(BufReader::new))?;
            migrations.extend(parsed);
        }

        tracing::debug!(
            dir = %self.dir.display(),
            files = files.len(),
            migrations = migrations.len(),
            "scanned migration directory"
        );

        sort_by_id(&mut migrations);
        Ok(migrations)
    }
}
