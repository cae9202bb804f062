use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::environment::{self, Environment, Variable};

/// A value given inline or read from an environment variable when the configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum Secret {
    Plain(String),
    #[serde(rename_all = "camelCase")]
    FromEnvironment { variable: Variable },
}

impl Secret {
    pub fn resolve(&self, environment: impl Environment) -> Result<String, environment::Error> {
        match self {
            Secret::Plain(value) => Ok(value.clone()),
            Secret::FromEnvironment { variable } => environment.read(variable),
        }
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret::Plain(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret::from(value.to_string())
    }
}
