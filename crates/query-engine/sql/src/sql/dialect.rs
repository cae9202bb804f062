//! The SQL dialects we can render statements for.

use std::fmt;

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A target relational database dialect.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Sqlite,
    Postgres,
    Mysql,
}

impl Dialect {
    /// The character used to quote identifiers.
    pub fn quote_char(self) -> char {
        match self {
            Dialect::Sqlite | Dialect::Postgres => '"',
            Dialect::Mysql => '`',
        }
    }

    /// Wrap an identifier in the dialect's quotes, doubling any embedded quote character.
    pub fn escape_identifier(self, name: &str) -> String {
        let quote = self.quote_char();
        let mut escaped = String::with_capacity(name.len() + 2);
        escaped.push(quote);
        for c in name.chars() {
            if c == quote {
                escaped.push(quote);
            }
            escaped.push(c);
        }
        escaped.push(quote);
        escaped
    }

    /// The placeholder for the parameter at the given 1-based index.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
        }
    }

    /// Whether the driver binds JSON documents natively rather than as JSON-encoded text.
    pub fn binds_json_natively(self) -> bool {
        matches!(self, Dialect::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Mysql => write!(f, "mysql"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Dialect;

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(
            Dialect::Sqlite.escape_identifier("we\"ird"),
            "\"we\"\"ird\""
        );
        assert_eq!(
            Dialect::Postgres.escape_identifier("a\"; DROP TABLE users; --"),
            "\"a\"\"; DROP TABLE users; --\""
        );
        assert_eq!(Dialect::Mysql.escape_identifier("we`ird"), "`we``ird`");
        // the other quote style is left alone
        assert_eq!(Dialect::Mysql.escape_identifier("a\"b"), "`a\"b`");
    }

    #[test]
    fn placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Sqlite.placeholder(3), "?");
        assert_eq!(Dialect::Mysql.placeholder(1), "?");
    }

    #[test]
    fn round_trips_through_serde() {
        for dialect in enum_iterator::all::<Dialect>() {
            let json = serde_json::to_value(dialect).unwrap();
            assert_eq!(json, serde_json::Value::String(dialect.to_string()));
            let back: Dialect = serde_json::from_value(json).unwrap();
            assert_eq!(back, dialect);
        }
    }
}
