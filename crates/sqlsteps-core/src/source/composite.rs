use super::{sort_by_id, MigrationSource};
use crate::error::Result;
use crate::migration::Migration;

/// Concatenates several sources and re-sorts the result by id.
///
/// No deduplication happens here: the same id coming from two origins is
/// reported by the migrator's validation step.
#[derive(Default)]
pub struct CompositeSource {
    sources: Vec<Box<dyn MigrationSource + Send + Sync>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source<S>(mut self, source: S) -> Self
    where
        S: MigrationSource + Send + Sync + 'static,
    {
        self.add_source(source);
        self
    }

    pub fn add_source<S>(&mut self, source: S)
    where
        S: MigrationSource + Send + Sync + 'static,
    {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl MigrationSource for CompositeSource {
    fn migrations(&self) -> Result<Vec<Migration>> {
        let mut migrations = Vec::new();
        for source in &self.sources {
            migrations.extend(source.migrations()?);
        }
        sort_by_id(&mut migrations);
        Ok(migrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SemicolonDelimitedParser;
    use crate::source::{EmbeddedSource, ParserRegistry};

    fn embedded(scripts: &[(&str, &str)]) -> EmbeddedSource {
        let mut parsers = ParserRegistry::new();
        parsers.register_extension(".sql", SemicolonDelimitedParser);
        EmbeddedSource::new(parsers).with_scripts(scripts)
    }

    #[test]
    fn merges_and_sorts_without_dedup() {
        let composite = CompositeSource::new()
            .with_source(embedded(&[("b/3.sql", "-- id: 3\n"), ("b/1.sql", "-- id: 1\n")]))
            .with_source(embedded(&[("a/2.sql", "-- id: 2\n"), ("a/1.sql", "-- id: 1\n")]));

        assert_eq!(composite.len(), 2);
        let ids: Vec<i64> = composite.migrations().unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 1, 2, 3]);
    }

    #[test]
    fn empty_composite_is_empty() {
        let composite = CompositeSource::new();
        assert!(composite.is_empty());
        assert!(composite.migrations().unwrap().is_empty());
    }
}
