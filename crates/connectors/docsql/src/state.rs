//! Transient state used by the store.
//!
//! This is initialized when the store is opened.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info_span, Instrument};

use docsql_configuration::Configuration;
use query_engine_execution::executor::{Executor, PostgresExecutor, SqliteExecutor};
use query_engine_execution::{error, metrics};
use query_engine_sql::sql::dialect::Dialect;

/// State for our store.
#[derive(Debug, Clone)]
pub struct State {
    pub metrics: metrics::Metrics,
    pub executor: Arc<dyn Executor>,
}

/// Create a connection pool and wrap it inside a store State.
pub async fn create_state(
    configuration: &Configuration,
    metrics_registry: &mut prometheus::Registry,
) -> Result<State, InitializationError> {
    let metrics = async {
        let metrics_inner = metrics::Metrics::initialise(metrics_registry)
            .map_err(InitializationError::MetricsError)?;
        Ok::<_, InitializationError>(metrics_inner)
    }
    .instrument(info_span!("Setup metrics"))
    .await?;

    let executor = connect(configuration)
        .instrument(info_span!(
            "Create connection pool",
            dialect = %configuration.dialect
        ))
        .await?;

    Ok(State { metrics, executor })
}

async fn connect(configuration: &Configuration) -> Result<Arc<dyn Executor>, InitializationError> {
    let uri = configuration.connection_uri.as_str();
    let executor: Arc<dyn Executor> = match configuration.dialect {
        Dialect::Sqlite if is_in_memory(uri) => Arc::new(
            SqliteExecutor::in_memory()
                .await
                .map_err(InitializationError::UnableToCreatePool)?,
        ),
        Dialect::Sqlite => Arc::new(
            SqliteExecutor::connect(uri)
                .await
                .map_err(InitializationError::UnableToCreatePool)?,
        ),
        Dialect::Postgres => Arc::new(
            PostgresExecutor::connect(
                uri,
                configuration.pool_settings.max_connections,
                Duration::from_secs(configuration.pool_settings.pool_timeout),
            )
            .await
            .map_err(InitializationError::UnableToCreatePool)?,
        ),
        Dialect::Mysql => return Err(InitializationError::NoExecutor(Dialect::Mysql)),
    };
    Ok(executor)
}

fn is_in_memory(uri: &str) -> bool {
    uri.contains(":memory:") || uri.contains("mode=memory")
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to initialize connection pool: {0}")]
    UnableToCreatePool(error::Error),
    #[error("error initializing metrics: {0}")]
    MetricsError(error::Error),
    #[error("there is no executor for the {0} dialect")]
    NoExecutor(Dialect),
    #[error("unable to create collection {collection}: {source}")]
    CollectionSetup {
        collection: String,
        source: error::Error,
    },
}
