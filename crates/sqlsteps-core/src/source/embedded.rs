use super::{sort_by_id, MigrationSource, ParserRegistry};
use crate::error::Result;
use crate::migration::Migration;

/// Migration scripts compiled into the binary, typically via `include_str!`.
///
/// ```
/// use sqlsteps_core::{EmbeddedSource, MigrationSource, ParserRegistry, SemicolonDelimitedParser};
///
/// let mut parsers = ParserRegistry::new();
/// parsers.register_extension(".sql", SemicolonDelimitedParser);
///
/// let source = EmbeddedSource::new(parsers)
///     .with_script("0001_init.sql", "-- id: 1\nCREATE TABLE t (id INTEGER);\n");
/// assert_eq!(source.migrations().unwrap()[0].id, 1);
/// ```
#[derive(Debug)]
pub struct EmbeddedSource {
    scripts: Vec<(String, String)>,
    parsers: ParserRegistry,
}

impl EmbeddedSource {
    pub fn new(parsers: ParserRegistry) -> Self {
        Self {
            scripts: Vec::new(),
            parsers,
        }
    }

    pub fn with_script(mut self, name: impl Into<String>, script: impl Into<String>) -> Self {
        self.scripts.push((name.into(), script.into()));
        self
    }

    pub fn with_scripts<'a, I>(self, scripts: I) -> Self
    where
        I: IntoIterator<Item = &'a (&'a str, &'a str)>,
    {
        scripts
            .into_iter()
            .fold(self, |source, (name, script)| source.with_script(*name, *script))
    }
}

impl MigrationSource for EmbeddedSource {
    fn migrations(&self) -> Result<Vec<Migration>> {
        let mut migrations = Vec::new();
        for (name, script) in &self.scripts {
            let parsed = self
                .parsers
                .parse_named(name, || Ok::<_, std::io::Error>(script.as_bytes()))?;
            migrations.extend(parsed);
        }

        sort_by_id(&mut migrations);
        Ok(migrations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{BatchSeparatorParser, SemicolonDelimitedParser};

    const SCRIPTS: &[(&str, &str)] = &[
        ("migrations/002.sql", "-- id: 2\nSELECT 2;\n"),
        ("migrations/001.sql", "-- id: 1\nSELECT 1;\n"),
        ("migrations/001.mssql", "-- id: 7\nSELECT 7\nGO\n"),
    ];

    #[test]
    fn dispatches_by_name() {
        let mut parsers = ParserRegistry::new();
        parsers
            .register_extension(".sql", SemicolonDelimitedParser)
            .register_extension(".mssql", BatchSeparatorParser::default());

        let migrations = EmbeddedSource::new(parsers)
            .with_scripts(SCRIPTS)
            .migrations()
            .unwrap();

        let ids: Vec<i64> = migrations.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 7]);
        assert_eq!(migrations[2].commands, vec!["SELECT 7"]);
    }
}
