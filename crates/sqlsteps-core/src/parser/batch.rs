use std::io::{self, BufRead};

use super::{scan, Boundary, MigrationParser};
use crate::migration::Migration;

pub const DEFAULT_BATCH_SEPARATOR: &str = "GO";

/// Commands are separated by a line holding only the batch separator
/// (`GO` unless configured otherwise), compared case-insensitively.
#[derive(Debug, Clone)]
pub struct BatchSeparatorParser {
    separator: String,
}

impl BatchSeparatorParser {
    pub fn with_separator(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into().trim().to_string(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl Default for BatchSeparatorParser {
    fn default() -> Self {
        Self::with_separator(DEFAULT_BATCH_SEPARATOR)
    }
}

impl MigrationParser for BatchSeparatorParser {
    fn parse(&self, reader: &mut dyn BufRead) -> io::Result<Migration> {
        scan(reader, Boundary::Separator(&self.separator))
    }
}
