use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use super::{sort_by_id, MigrationSource, ParserRegistry};
use crate::error::Result;
use crate::migration::Migration;

/// Reads migration scripts from the entries of a zip archive.
///
/// Registered predicates are matched against each entry's full path inside
/// the archive (e.g. `migrations/0001_init.sql`). Directory entries are
/// skipped.
#[derive(Debug)]
pub struct ArchiveSource {
    path: PathBuf,
    parsers: ParserRegistry,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>, parsers: ParserRegistry) -> Self {
        Self {
            path: path.into(),
            parsers,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MigrationSource for ArchiveSource {
    fn migrations(&self) -> Result<Vec<Migration>> {
        let file = BufReader::new(File::open(&self.path)?);
        let mut migrations = read_archive(file, &self.parsers)?;

        tracing::debug!(
            archive = %self.path.display(),
            migrations = migrations.len(),
            "scanned migration archive"
        );

        sort_by_id(&mut migrations);
        Ok(migrations)
    }
}

fn read_archive<R: Read + Seek>(reader: R, parsers: &ParserRegistry) -> io::Result<Vec<Migration>> {
    let mut archive = ZipArchive::new(reader).map_err(archive_error)?;
    let mut migrations = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        // Entries are decompressed once; every matching parser reads the copy.
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;

        let parsed = parsers.parse_named(&name, || Ok::<_, io::Error>(contents.as_slice()))?;
        migrations.extend(parsed);
    }

    Ok(migrations)
}

fn archive_error(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
