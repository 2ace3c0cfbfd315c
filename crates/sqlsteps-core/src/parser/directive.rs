//! `-- key: value` metadata lines embedded in migration scripts.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::migration::Migration;

static ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^--+\s*id\s*:\s*(?P<value>.*)$").expect("valid id regex"));

static DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^--+\s*description\s*:\s?(?P<value>.*)$").expect("valid description regex")
});

static ENABLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^--+\s*enabled\s*:\s*(?P<value>.*)$").expect("valid enabled regex")
});

/// Apply a trimmed comment line to `migration`.
///
/// The first matching directive wins. Values that do not parse, and comments
/// that are not directives, leave the migration untouched.
pub(crate) fn apply(line: &str, migration: &mut Migration) {
    if let Some(value) = capture(&ID, line) {
        if let Ok(id) = value.trim().parse::<i64>() {
            migration.id = id;
        }
        return;
    }

    if let Some(value) = capture(&DESCRIPTION, line) {
        migration.description = Some(value.to_string());
        return;
    }

    if let Some(value) = capture(&ENABLED, line) {
        if let Some(enabled) = parse_bool(value.trim()) {
            migration.enabled = enabled;
        }
    }
}

fn capture<'a>(regex: &Regex, line: &'a str) -> Option<&'a str> {
    regex
        .captures(line)
        .and_then(|caps| caps.name("value"))
        .map(|m| m.as_str())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
