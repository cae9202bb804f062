//! Where configuration secrets are read from.

use std::collections::HashMap;
use std::ffi::OsString;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The name of an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize, JsonSchema)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Variable::new(value)
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the environment variable {0} is not set")]
    VariableNotPresent(Variable),
    #[error("the environment variable {0} is not valid unicode: {1:?}")]
    VariableNotUnicode(Variable, OsString),
}

/// A source of variable values.
pub trait Environment {
    fn read(&self, variable: &Variable) -> Result<String, Error>;
}

impl<E: Environment> Environment for &E {
    fn read(&self, variable: &Variable) -> Result<String, Error> {
        (*self).read(variable)
    }
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn read(&self, variable: &Variable) -> Result<String, Error> {
        std::env::var(variable.as_str()).map_err(|err| match err {
            std::env::VarError::NotPresent => Error::VariableNotPresent(variable.clone()),
            std::env::VarError::NotUnicode(value) => {
                Error::VariableNotUnicode(variable.clone(), value)
            }
        })
    }
}

/// A fixed set of variables, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment(HashMap<Variable, String>);

impl<const N: usize> From<[(Variable, String); N]> for FixedEnvironment {
    fn from(variables: [(Variable, String); N]) -> Self {
        FixedEnvironment(variables.into_iter().collect())
    }
}

impl Environment for FixedEnvironment {
    fn read(&self, variable: &Variable) -> Result<String, Error> {
        self.0
            .get(variable)
            .cloned()
            .ok_or_else(|| Error::VariableNotPresent(variable.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_environment_reads_what_it_holds() {
        let environment = FixedEnvironment::from([(
            Variable::from("DOCSQL_CONNECTION_URI"),
            "sqlite::memory:".to_string(),
        )]);
        assert_eq!(
            environment
                .read(&Variable::from("DOCSQL_CONNECTION_URI"))
                .unwrap(),
            "sqlite::memory:"
        );
        assert!(matches!(
            environment.read(&Variable::from("MISSING")),
            Err(Error::VariableNotPresent(_))
        ));
    }
}
