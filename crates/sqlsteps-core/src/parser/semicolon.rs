use std::io::{self, BufRead};

use super::{scan, Boundary, MigrationParser};
use crate::migration::Migration;

/// A command ends on the line whose last non-whitespace character is `;`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemicolonDelimitedParser;

impl MigrationParser for SemicolonDelimitedParser {
    fn parse(&self, reader: &mut dyn BufRead) -> io::Result<Migration> {
        scan(reader, Boundary::Semicolon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LINE_SEPARATOR;

    #[test]
    fn trailing_statement_without_semicolon_is_discarded() {
        let m = SemicolonDelimitedParser
            .parse_str("SELECT 1;\nSELECT 2")
            .unwrap();
        assert_eq!(m.commands, vec!["SELECT 1;"]);
    }

    #[test]
    fn statements_span_lines_and_skip_blanks() {
        let script = "\
-- id: 2
-- description: Create Table2

CREATE TABLE Table2 (

    Id INTEGER PRIMARY KEY,
    Name TEXT
);
INSERT INTO Table2 (Name) VALUES ('x');   
";
        let m = SemicolonDelimitedParser.parse_str(script).unwrap();
        assert_eq!(m.id, 2);
        assert_eq!(
            m.commands,
            vec![
                [
                    "CREATE TABLE Table2 (",
                    "Id INTEGER PRIMARY KEY,",
                    "Name TEXT",
                    ");"
                ]
                .join(LINE_SEPARATOR),
                "INSERT INTO Table2 (Name) VALUES ('x');".to_string(),
            ]
        );
    }

    #[test]
    fn semicolon_mid_line_is_not_a_boundary() {
        let m = SemicolonDelimitedParser
            .parse_str("SELECT ';' AS x\nFROM t;\n")
            .unwrap();
        assert_eq!(m.commands, vec![["SELECT ';' AS x", "FROM t;"].join(LINE_SEPARATOR)]);
    }

    #[test]
    fn disabled_directive_is_read() {
        let m = SemicolonDelimitedParser
            .parse_str("-- id: 10\n-- enabled: false\nSELECT 1;\n")
            .unwrap();
        assert_eq!(m.id, 10);
        assert!(!m.enabled);
        assert_eq!(m.commands.len(), 1);
    }
}
