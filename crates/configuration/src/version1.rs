//! The version 1 configuration file format.

use std::collections::BTreeMap;
use std::path::Path;

use query_engine_sql::sql::dialect::Dialect;
use query_engine_translation::translation::helpers::default_array_field_hints;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::environment::Variable;
use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::{ConnectionUri, PoolSettings, Secret};

const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";
pub const DEFAULT_CONNECTION_URI_VARIABLE: &str = "DOCSQL_CONNECTION_URI";

/// Everything needed to open a store, as written in `configuration.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    // Which version of the configuration format are we using
    pub version: u32,
    pub dialect: Dialect,
    pub connection_uri: ConnectionUri,
    #[serde(skip_serializing_if = "PoolSettings::is_default")]
    #[serde(default)]
    pub pool_settings: PoolSettings,
    /// Keep fields a collection schema does not declare in an `_extra` JSON column.
    #[serde(default)]
    pub extra_fields: bool,
    /// Fields treated as arrays in collections without a schema.
    #[serde(default = "default_array_field_hints")]
    pub array_field_hints: Vec<String>,
    /// Collections created when the store opens, with their JSON Schema.
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, serde_json::Value>,
}

impl ParsedConfiguration {
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            dialect: Dialect::Sqlite,
            connection_uri: ConnectionUri(Secret::FromEnvironment {
                variable: Variable::from(DEFAULT_CONNECTION_URI_VARIABLE),
            }),
            pool_settings: PoolSettings::default(),
            extra_fields: false,
            array_field_hints: default_array_field_hints(),
            collections: BTreeMap::new(),
        }
    }

    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }
}

/// Parse the configuration file found in a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    if parsed_config.version != CURRENT_VERSION {
        return Err(ParseConfigurationError::UnsupportedVersion(
            parsed_config.version,
        ));
    }

    tracing::debug!(
        file = %configuration_file.display(),
        collections = parsed_config.collections.len(),
        "parsed configuration"
    );
    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk, with a JSON Schema describing it.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = schemars::schema_for!(ParsedConfiguration);
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}
