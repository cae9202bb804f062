//! The `docsql` command line: print the SQL a document operation translates to.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use docsql_configuration::environment::ProcessEnvironment;
use docsql_configuration::ParsedConfiguration;
use query_engine_execution::query::pretty;
use query_engine_metadata::metadata::{Document, InMemorySchemaRegistry};
use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::string::SQL;
use query_engine_translation::translation::helpers::TranslationOptions;
use query_engine_translation::translation::mutation::MutationScope;
use query_engine_translation::translation::schema::index::IndexOptions;
use query_engine_translation::translation::Translator;

use crate::store::DocumentStore;

#[derive(Debug, Parser)]
#[command(name = "docsql", version, about = "Translate document operations to SQL")]
pub struct Cli {
    #[command(flatten)]
    pub context: Context,
    #[command(subcommand)]
    pub command: Command,
}

/// What the operations are translated against.
#[derive(Debug, Args)]
pub struct Context {
    /// The SQL dialect to render. Overrides the configuration's.
    #[arg(long, global = true, value_parser = parse_dialect)]
    pub dialect: Option<Dialect>,
    /// A configuration directory whose collections are registered before translating.
    #[arg(long, global = true, env = "DOCSQL_CONFIGURATION_DIRECTORY")]
    pub configuration: Option<PathBuf>,
    /// The collection the operation applies to.
    #[arg(long, global = true, default_value = "documents")]
    pub collection: String,
    /// A JSON Schema registered for the collection before translating.
    #[arg(long, global = true, value_parser = parse_json)]
    pub schema: Option<Value>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write an initial configuration into the configuration directory.
    Initialize,
    /// Connect to the configured database and create the declared collections.
    Check,
    /// Translate a filter into the body of a WHERE clause.
    TranslateFilter {
        #[arg(value_parser = parse_document)]
        filter: Document,
        /// Qualify columns with this table alias.
        #[arg(long)]
        alias: Option<String>,
    },
    /// Translate an update of the documents matching a filter.
    TranslateUpdate {
        #[arg(value_parser = parse_document)]
        update: Document,
        #[arg(long, value_parser = parse_document, default_value = "{}")]
        filter: Document,
        /// Update every matching document rather than the first.
        #[arg(long)]
        many: bool,
    },
    /// Translate a JSON Schema into a CREATE TABLE statement.
    TranslateSchema {
        #[arg(value_parser = parse_json)]
        json_schema: Option<Value>,
    },
    /// Translate an index definition such as `{"email": 1, "age": -1}`.
    TranslateIndex {
        #[arg(value_parser = parse_document)]
        fields: Document,
        #[arg(long)]
        name: String,
        #[arg(long)]
        unique: bool,
        #[arg(long)]
        sparse: bool,
    },
}

/// Run the command. Translations render the SQL, followed by its parameters one per line.
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    let Cli { context, command } = cli;
    match command {
        Command::Initialize => initialize(&context).await,
        Command::Check => check(&context).await,
        command => {
            let translator = translator(&context).await?;
            let sql = translate(&translator, &context.collection, command)?;
            Ok(render(&sql))
        }
    }
}

fn translate(translator: &Translator, collection: &str, command: Command) -> anyhow::Result<SQL> {
    let sql = match command {
        Command::TranslateFilter { filter, alias } => {
            translator.translate_filter(collection, &filter, alias.as_deref())?
        }
        Command::TranslateUpdate {
            update,
            filter,
            many,
        } => {
            let scope = if many {
                MutationScope::Many
            } else {
                MutationScope::One
            };
            translator.translate_update(collection, &update, &filter, scope)?
        }
        Command::TranslateSchema { json_schema } => {
            translator.translate_schema(collection, json_schema.as_ref())?
        }
        Command::TranslateIndex {
            fields,
            name,
            unique,
            sparse,
        } => translator.translate_create_index(
            collection,
            &name,
            &fields,
            &IndexOptions { unique, sparse },
        )?,
        Command::Initialize | Command::Check => {
            anyhow::bail!("{command:?} does not translate anything")
        }
    };
    Ok(sql)
}

async fn initialize(context: &Context) -> anyhow::Result<String> {
    let directory = configuration_directory(context)?;
    let mut parsed = ParsedConfiguration::initial();
    if let Some(dialect) = context.dialect {
        parsed.dialect = dialect;
    }
    docsql_configuration::write_parsed_configuration(parsed, directory).await?;
    Ok(format!("wrote configuration to {}", directory.display()))
}

async fn check(context: &Context) -> anyhow::Result<String> {
    let directory = configuration_directory(context)?;
    let parsed = docsql_configuration::parse_configuration(directory).await?;
    let mut configuration =
        docsql_configuration::make_runtime_configuration(parsed, ProcessEnvironment)?;
    if let Some(dialect) = context.dialect {
        configuration.dialect = dialect;
    }
    DocumentStore::open(&configuration, &mut prometheus::Registry::new()).await?;
    Ok(format!(
        "connected to {} and created {} collection(s)",
        configuration.dialect,
        configuration.collections.len()
    ))
}

fn configuration_directory(context: &Context) -> anyhow::Result<&PathBuf> {
    context
        .configuration
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("--configuration is required for this command"))
}

async fn translator(context: &Context) -> anyhow::Result<Translator> {
    // translating needs no connection, so the connection URI is never resolved here
    let parsed = match &context.configuration {
        Some(directory) => docsql_configuration::parse_configuration(directory).await?,
        None => ParsedConfiguration::initial(),
    };
    let options = TranslationOptions {
        extra_fields: parsed.extra_fields,
        array_field_hints: parsed.array_field_hints,
    };
    let dialect = context.dialect.unwrap_or(parsed.dialect);

    let translator = Translator::new(dialect, Arc::new(InMemorySchemaRegistry::new()), options);
    for (name, json_schema) in &parsed.collections {
        translator.translate_schema(name, Some(json_schema))?;
    }
    if let Some(json_schema) = &context.schema {
        translator.translate_schema(&context.collection, Some(json_schema))?;
    }
    Ok(translator)
}

fn render(sql: &SQL) -> String {
    let mut output = pretty(&sql.sql);
    for (index, param) in sql.params.iter().enumerate() {
        output.push_str(&format!("\n{}: {:?}", index + 1, param));
    }
    output
}

fn parse_dialect(value: &str) -> Result<Dialect, String> {
    serde_json::from_value(Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown dialect '{value}', expected sqlite, postgres or mysql"))
}

fn parse_json(value: &str) -> Result<Value, String> {
    serde_json::from_str(value).map_err(|err| err.to_string())
}

fn parse_document(value: &str) -> Result<Document, String> {
    match parse_json(value)? {
        Value::Object(document) => Ok(document),
        other => Err(format!("expected a JSON object, got {other}")),
    }
}
