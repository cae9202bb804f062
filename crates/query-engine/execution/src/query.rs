//! Execute a translated statement.

use query_engine_sql::sql;
use tracing::{info_span, Instrument};

use crate::error::Error;
use crate::executor::{Executor, QueryResult};
use crate::metrics;

/// Execute a statement, recording its latency and outcome.
pub async fn execute(
    executor: &dyn Executor,
    metrics: &metrics::Metrics,
    query: &sql::string::SQL,
) -> Result<QueryResult, Error> {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(
            generated_sql = %pretty(&query.sql),
            params = ?&query.params,
            "executing statement"
        );
    }

    let timer = metrics.execution_duration_seconds.start_timer();
    let result = executor
        .execute(&query.sql, &query.params)
        .instrument(info_span!("Execute SQL", dialect = %query.dialect))
        .await;
    timer.observe_duration();

    match &result {
        Ok(outcome) => {
            metrics.statements_total.inc();
            tracing::debug!(row_count = outcome.row_count, "statement executed");
        }
        Err(err) => {
            metrics.statement_failures_total.inc();
            tracing::error!(error = %err, "statement failed");
        }
    }
    result
}

/// Format a statement for humans.
pub fn pretty(sql: &str) -> String {
    sqlformat::format(
        sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}
