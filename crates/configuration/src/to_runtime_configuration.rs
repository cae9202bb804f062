//! Convert a parsed configuration into the runtime configuration the store is opened with.

use query_engine_translation::translation::helpers::TranslationOptions;

use crate::configuration::Configuration;
use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::version1::ParsedConfiguration;

/// Resolve secrets and check collection schemas are shaped like schemas.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let connection_uri = parsed_config
        .connection_uri
        .0
        .resolve(&environment)
        .map_err(|error| MakeRuntimeConfigurationError::MissingEnvironmentVariable {
            field_name: "connectionUri".into(),
            message: error.to_string(),
        })?;

    if let Some((collection, _)) = parsed_config
        .collections
        .iter()
        .find(|(_, schema)| !schema.is_object())
    {
        return Err(MakeRuntimeConfigurationError::MalformedCollectionSchema {
            collection: collection.clone(),
        });
    }

    Ok(Configuration {
        dialect: parsed_config.dialect,
        connection_uri,
        pool_settings: parsed_config.pool_settings,
        translation_options: TranslationOptions {
            extra_fields: parsed_config.extra_fields,
            array_field_hints: parsed_config.array_field_hints,
        },
        collections: parsed_config.collections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{FixedEnvironment, Variable};
    use crate::values::{ConnectionUri, Secret};
    use crate::version1::DEFAULT_CONNECTION_URI_VARIABLE;
    use serde_json::json;

    #[test]
    fn secrets_are_read_from_the_environment() {
        let environment = FixedEnvironment::from([(
            Variable::from(DEFAULT_CONNECTION_URI_VARIABLE),
            "postgres://docsql@localhost/docsql".to_string(),
        )]);
        let mut parsed = ParsedConfiguration::initial();
        parsed.extra_fields = true;

        let configuration = make_runtime_configuration(parsed, environment).unwrap();
        assert_eq!(
            configuration.connection_uri,
            "postgres://docsql@localhost/docsql"
        );
        assert!(configuration.translation_options.extra_fields);
    }

    #[test]
    fn plain_secrets_need_no_environment() {
        let mut parsed = ParsedConfiguration::initial();
        parsed.connection_uri = ConnectionUri(Secret::from("sqlite::memory:"));
        let configuration =
            make_runtime_configuration(parsed, FixedEnvironment::default()).unwrap();
        assert_eq!(configuration.connection_uri, "sqlite::memory:");
    }

    #[test]
    fn missing_variables_name_the_field() {
        let error =
            make_runtime_configuration(ParsedConfiguration::initial(), FixedEnvironment::default())
                .unwrap_err();
        assert!(matches!(
            error,
            MakeRuntimeConfigurationError::MissingEnvironmentVariable { ref field_name, .. }
                if field_name == "connectionUri"
        ));
    }

    #[test]
    fn collection_schemas_must_be_objects() {
        let mut parsed = ParsedConfiguration::initial();
        parsed.connection_uri = ConnectionUri(Secret::from("sqlite::memory:"));
        parsed
            .collections
            .insert("users".to_string(), json!(["not", "a", "schema"]));
        assert!(matches!(
            make_runtime_configuration(parsed, FixedEnvironment::default()),
            Err(MakeRuntimeConfigurationError::MalformedCollectionSchema { collection })
                if collection == "users"
        ));
    }
}
