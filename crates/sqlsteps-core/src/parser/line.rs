use std::io::{self, BufRead};

use super::{scan, Boundary, MigrationParser};
use crate::migration::Migration;

/// Commands are separated by blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineDelimitedParser;

impl MigrationParser for LineDelimitedParser {
    fn parse(&self, reader: &mut dyn BufRead) -> io::Result<Migration> {
        scan(reader, Boundary::BlankLine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LINE_SEPARATOR;

    #[test]
    fn blank_lines_split_commands() {
        let script = "\
-- id: 4
-- description: two tables
CREATE TABLE a (
    id INTEGER
)

CREATE TABLE b (id INTEGER)

";
        let m = LineDelimitedParser.parse_str(script).unwrap();
        assert_eq!(m.id, 4);
        assert_eq!(m.description.as_deref(), Some("two tables"));
        assert_eq!(
            m.commands,
            vec![
                ["CREATE TABLE a (", "id INTEGER", ")"].join(LINE_SEPARATOR),
                "CREATE TABLE b (id INTEGER)".to_string(),
            ]
        );
    }

    #[test]
    fn consecutive_blank_lines_do_not_emit_empty_commands() {
        let m = LineDelimitedParser
            .parse_str("SELECT 1\n\n\n\nSELECT 2\n\n")
            .unwrap();
        assert_eq!(m.commands, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn comments_inside_a_block_are_dropped() {
        let m = LineDelimitedParser
            .parse_str("SELECT 1,\n-- second column\n2\n\n")
            .unwrap();
        assert_eq!(m.commands, vec![["SELECT 1,", "2"].join(LINE_SEPARATOR)]);
    }

    #[test]
    fn trailing_block_without_blank_line_is_discarded() {
        let m = LineDelimitedParser
            .parse_str("SELECT 1\n\nSELECT 2")
            .unwrap();
        assert_eq!(m.commands, vec!["SELECT 1"]);
    }
}
