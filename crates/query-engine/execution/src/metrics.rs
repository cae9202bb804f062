//! Metrics setup and update for the document store.

use prometheus::core::{AtomicU64, GenericCounter};
use prometheus::Histogram;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub statements_total: GenericCounter<AtomicU64>,
    pub statement_failures_total: GenericCounter<AtomicU64>,
    pub translation_failures_total: GenericCounter<AtomicU64>,
    pub execution_duration_seconds: Histogram,
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new histogram metric and register it with the provided Prometheus Registry
fn add_histogram_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<Histogram, Error> {
    let histogram = Histogram::with_opts(prometheus::HistogramOpts::new(
        metric_name,
        metric_description,
    ))?;
    metrics_registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

impl Metrics {
    /// Setup counters and histograms used to produce Prometheus metrics
    pub fn initialise(metrics_registry: &mut prometheus::Registry) -> Result<Self, Error> {
        let statements_total = add_int_counter_metric(
            metrics_registry,
            "docsql_statements_total",
            "Total statements executed successfully.",
        )?;

        let statement_failures_total = add_int_counter_metric(
            metrics_registry,
            "docsql_statement_failures_total",
            "Total statements the database failed.",
        )?;

        let translation_failures_total = add_int_counter_metric(
            metrics_registry,
            "docsql_translation_failures_total",
            "Total operations rejected before reaching the database.",
        )?;

        let execution_duration_seconds = add_histogram_metric(
            metrics_registry,
            "docsql_execution_duration_seconds",
            "Time spent executing statements.",
        )?;

        Ok(Metrics {
            statements_total,
            statement_failures_total,
            translation_failures_total,
            execution_duration_seconds,
        })
    }

    /// Metrics registered with a registry of their own, for callers that do not export them.
    pub fn unexported() -> Result<Self, Error> {
        Metrics::initialise(&mut prometheus::Registry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_once_per_registry() {
        let mut registry = prometheus::Registry::new();
        let metrics = Metrics::initialise(&mut registry).unwrap();
        metrics.statements_total.inc();
        assert_eq!(metrics.statements_total.get(), 1);
        assert!(matches!(
            Metrics::initialise(&mut registry),
            Err(Error::Metrics(_))
        ));
    }
}
