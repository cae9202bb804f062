//! Type definitions of a low-level SQL string representation.

use serde::Serialize;

use super::dialect::Dialect;

/// A SQL statement (or fragment of one) and the parameters bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    pub dialect: Dialect,
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// A JSON document. Only produced for dialects that bind JSON natively.
    Json(serde_json::Value),
}

impl SQL {
    pub fn new(dialect: Dialect) -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            dialect,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn append_identifier(&mut self, sql: &str) {
        let escaped = self.dialect.escape_identifier(sql);
        self.sql.push_str(&escaped);
    }

    pub fn append_param(&mut self, param: Param) {
        self.params.push(param);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Append a constant string literal. Single quotes are doubled.
    pub fn append_string_literal(&mut self, literal: &str) {
        self.sql.push('\'');
        self.sql.push_str(&literal.replace('\'', "''"));
        self.sql.push('\'');
    }
}
