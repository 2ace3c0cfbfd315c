//! # sqlsteps-core
//!
//! Applies an ordered set of versioned SQL scripts to a database exactly once
//! each, recording applied ids in a bookkeeping table inside the target
//! database.
//!
//! The crate is database-agnostic: scripts are turned into [`Migration`]s by a
//! [`MigrationParser`], collected by a [`MigrationSource`], and applied by the
//! [`Migrator`] through a dialect-specific [`Backend`].

pub mod backend;
pub mod cancel;
pub mod migration;
pub mod migrator;
pub mod parser;
pub mod source;

mod error;

pub use backend::{Backend, TableDefinition, TableStatus};
pub use cancel::CancelFlag;
pub use error::{BoxError, MigrateError, Result, ValidationError};
pub use migration::{Migration, MigrationReport};
pub use migrator::{Migrator, MigratorOptions};
pub use parser::{
    BatchSeparatorParser, LineDelimitedParser, MigrationParser, SemicolonDelimitedParser,
};
pub use source::{
    ArchiveSource, CompositeSource, DirectorySource, EmbeddedSource, MatchPolicy, MigrationSource,
    ParserRegistry,
};
