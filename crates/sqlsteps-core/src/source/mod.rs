//! Migration sources: enumerate named script streams from an origin and
//! parse them with the parsers registered for their names.

mod archive;
mod composite;
mod directory;
mod embedded;

use std::io::{self, BufRead};
use std::sync::Arc;

use crate::error::Result;
use crate::migration::Migration;
use crate::parser::MigrationParser;

pub use archive::ArchiveSource;
pub use composite::CompositeSource;
pub use directory::DirectorySource;
pub use embedded::EmbeddedSource;

/// Supplies a collection of parsed migrations, sorted ascending by id.
pub trait MigrationSource {
    fn migrations(&self) -> Result<Vec<Migration>>;
}

/// How many registered parsers may claim a single stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Every matching parser parses the stream, yielding one migration each.
    #[default]
    AllMatches,
    /// Only the first matching parser (in registration order) is used.
    FirstMatch,
}

type Predicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Ordered `(name predicate, parser)` pairs.
pub struct ParserRegistry {
    entries: Vec<(Predicate, Arc<dyn MigrationParser>)>,
    policy: MatchPolicy,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::with_policy(MatchPolicy::default())
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    /// Use `parser` for every stream whose name satisfies `predicate`.
    pub fn register<F, P>(&mut self, predicate: F, parser: P) -> &mut Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
        P: MigrationParser + 'static,
    {
        self.entries.push((Box::new(predicate), Arc::new(parser)));
        self
    }

    /// Use `parser` for every stream whose name ends with `extension`,
    /// ignoring case.
    pub fn register_extension<P>(&mut self, extension: &str, parser: P) -> &mut Self
    where
        P: MigrationParser + 'static,
    {
        let extension = extension.to_lowercase();
        self.register(
            move |name: &str| name.to_lowercase().ends_with(&extension),
            parser,
        )
    }

    /// Parse the stream called `name` once per matching parser.
    ///
    /// `open` is called for every match so each parser reads the stream from
    /// the start. Streams no parser claims yield nothing.
    pub fn parse_named<F, R>(&self, name: &str, mut open: F) -> io::Result<Vec<Migration>>
    where
        F: FnMut() -> io::Result<R>,
        R: BufRead,
    {
        let mut migrations = Vec::new();

        for (predicate, parser) in &self.entries {
            if !predicate(name) {
                continue;
            }

            let mut reader = open()?;
            let migration = parser.parse(&mut reader)?;
            tracing::debug!(name, id = migration.id, "loaded migration script");
            migrations.push(migration);

            if self.policy == MatchPolicy::FirstMatch {
                break;
            }
        }

        Ok(migrations)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parsers", &self.entries.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Stable ascending sort by id; equal ids keep their enumeration order.
pub(crate) fn sort_by_id(migrations: &mut [Migration]) {
    migrations.sort_by_key(|m| m.id);
}
