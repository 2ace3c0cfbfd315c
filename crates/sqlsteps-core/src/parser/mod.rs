//! Script parsers.
//!
//! Every parser runs the same line scanner: lines are trimmed, `--` lines are
//! metadata directives (see [`directive`]) or plain comments, and all other
//! non-blank lines are buffered until the variant's boundary closes the
//! current command. A buffer still open at end of stream is discarded.

mod batch;
mod directive;
mod line;
mod semicolon;

use std::io::{self, BufRead};

use crate::migration::Migration;

pub use batch::{BatchSeparatorParser, DEFAULT_BATCH_SEPARATOR};
pub use line::LineDelimitedParser;
pub use semicolon::SemicolonDelimitedParser;

/// Separator used when joining the buffered lines of one command.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Turns a raw script stream into a [`Migration`].
///
/// Parsing only fails on I/O errors (including invalid UTF-8); unrecognized
/// or malformed directives are ignored.
pub trait MigrationParser: Send + Sync {
    fn parse(&self, reader: &mut dyn BufRead) -> io::Result<Migration>;

    fn parse_str(&self, script: &str) -> io::Result<Migration> {
        self.parse(&mut script.as_bytes())
    }
}

/// What closes the pending command buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Boundary<'a> {
    /// An empty line.
    BlankLine,
    /// A line whose last non-whitespace character is `;`. The line itself
    /// belongs to the command it closes.
    Semicolon,
    /// A line equal to the token, ignoring ASCII case. The line is dropped.
    Separator(&'a str),
}

pub(crate) fn scan(reader: &mut dyn BufRead, boundary: Boundary<'_>) -> io::Result<Migration> {
    let mut migration = Migration::default();
    let mut pending: Vec<String> = Vec::new();

    for raw in reader.lines() {
        let raw = raw?;
        let line = raw.trim();

        if line.is_empty() {
            if let Boundary::BlankLine = boundary {
                flush(&mut pending, &mut migration);
            }
            continue;
        }

        if let Boundary::Separator(token) = boundary {
            if line.eq_ignore_ascii_case(token) {
                flush(&mut pending, &mut migration);
                continue;
            }
        }

        if line.starts_with("--") {
            directive::apply(line, &mut migration);
            continue;
        }

        pending.push(line.to_string());

        if let Boundary::Semicolon = boundary {
            if line.ends_with(';') {
                flush(&mut pending, &mut migration);
            }
        }
    }

    if !pending.is_empty() {
        tracing::warn!(
            id = migration.id,
            lines = pending.len(),
            "discarding unterminated command at end of script"
        );
    }

    tracing::debug!(
        id = migration.id,
        commands = migration.commands.len(),
        enabled = migration.enabled,
        "parsed migration script"
    );

    Ok(migration)
}

fn flush(pending: &mut Vec<String>, migration: &mut Migration) {
    if pending.is_empty() {
        return;
    }
    migration.commands.push(pending.join(LINE_SEPARATOR));
    pending.clear();
}
