use std::fmt;

use prometheus::{histogram_opts, opts, HistogramVec, IntCounter, IntCounterVec, Registry};
use tokio::time::Instant;

use crate::Error;

/// Kind of EC2 call, as used in the `op_type` label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpType {
    Create,
    ReadOne,
    ReadMany,
    Update,
    Delete,
}

impl OpType {
    pub fn as_str(self) -> &'static str {
        match self {
            OpType::Create => "CREATE",
            OpType::ReadOne => "READ_ONE",
            OpType::ReadMany => "READ_MANY",
            OpType::Update => "UPDATE",
            OpType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives one record per EC2 invocation.
pub trait MetricsRecorder: Send + Sync {
    fn record_api_call(&self, op_type: OpType, op_name: &str, error: Option<&Error>);
}

#[derive(Clone)]
pub struct Metrics {
    pub api_calls: IntCounterVec,
    pub api_call_errors: IntCounterVec,
    pub reconciliations: IntCounter,
    pub failures: IntCounterVec,
    pub reconcile_duration: HistogramVec,
}

impl Default for Metrics {
    fn default() -> Self {
        let api_calls = IntCounterVec::new(
            opts!("ec2_controller_api_calls_total", "EC2 API calls"),
            &["op_type", "op_name"],
        )
        .unwrap();
        let api_call_errors = IntCounterVec::new(
            opts!("ec2_controller_api_call_errors_total", "failed EC2 API calls"),
            &["op_type", "op_name", "error"],
        )
        .unwrap();
        let reconcile_duration = HistogramVec::new(
            histogram_opts!(
                "ec2_controller_reconcile_duration_seconds",
                "The duration of resource manager operations in seconds"
            )
            .buckets(vec![0.01, 0.1, 0.25, 0.5, 1., 5., 15., 60.]),
            &["kind", "operation"],
        )
        .unwrap();
        let failures = IntCounterVec::new(
            opts!(
                "ec2_controller_reconcile_failures_total",
                "reconciliation errors",
            ),
            &["kind", "error"],
        )
        .unwrap();
        let reconciliations =
            IntCounter::new("ec2_controller_reconciliations_total", "reconciliations").unwrap();
        Metrics {
            api_calls,
            api_call_errors,
            reconciliations,
            failures,
            reconcile_duration,
        }
    }
}

impl Metrics {
    /// Register API metrics to start tracking them.
    pub fn register(self, registry: &Registry) -> Result<Self, prometheus::Error> {
        registry.register(Box::new(self.api_calls.clone()))?;
        registry.register(Box::new(self.api_call_errors.clone()))?;
        registry.register(Box::new(self.reconcile_duration.clone()))?;
        registry.register(Box::new(self.failures.clone()))?;
        registry.register(Box::new(self.reconciliations.clone()))?;
        Ok(self)
    }

    pub fn reconcile_failure(&self, kind: &str, e: &Error) {
        self.failures
            .with_label_values(&[kind, e.metric_label()])
            .inc()
    }

    pub fn count_and_measure(
        &self,
        kind: &'static str,
        operation: &'static str,
    ) -> ReconcileMeasurer {
        self.reconciliations.inc();
        ReconcileMeasurer {
            start: Instant::now(),
            metric: self.reconcile_duration.clone(),
            labels: [kind, operation],
        }
    }
}

impl MetricsRecorder for Metrics {
    fn record_api_call(&self, op_type: OpType, op_name: &str, error: Option<&Error>) {
        self.api_calls
            .with_label_values(&[op_type.as_str(), op_name])
            .inc();
        if let Some(e) = error {
            let label = match e {
                Error::Api { source, .. } => source.code.as_str(),
                e => e.metric_label(),
            };
            self.api_call_errors
                .with_label_values(&[op_type.as_str(), op_name, label])
                .inc();
        }
    }
}

/// Smart function duration measurer
///
/// Relies on Drop to calculate duration and register the observation in the histogram
pub struct ReconcileMeasurer {
    start: Instant,
    metric: HistogramVec,
    labels: [&'static str; 2],
}

impl Drop for ReconcileMeasurer {
    fn drop(&mut self) {
        #[allow(clippy::cast_precision_loss)]
        let duration = self.start.elapsed().as_millis() as f64 / 1000.0;
        self.metric.with_label_values(&self.labels).observe(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ec2::ApiError;

    #[test]
    fn test_records_api_calls_and_errors() {
        let metrics = Metrics::default();
        metrics.record_api_call(OpType::Update, "CreateTags", None);
        let err = Error::Api {
            operation: "CreateTags",
            source: ApiError::new("RequestLimitExceeded", "slow down"),
        };
        metrics.record_api_call(OpType::Update, "CreateTags", Some(&err));

        assert_eq!(
            metrics
                .api_calls
                .with_label_values(&["UPDATE", "CreateTags"])
                .get(),
            2
        );
        assert_eq!(
            metrics
                .api_call_errors
                .with_label_values(&["UPDATE", "CreateTags", "RequestLimitExceeded"])
                .get(),
            1
        );
    }

    #[test]
    fn test_register_and_measure() {
        let registry = Registry::new();
        let metrics = Metrics::default().register(&registry).unwrap();
        drop(metrics.count_and_measure("RouteTable", "update"));
        metrics.reconcile_failure("RouteTable", &Error::NotFound);
        assert_eq!(metrics.reconciliations.get(), 1);
        assert_eq!(
            metrics
                .reconcile_duration
                .with_label_values(&["RouteTable", "update"])
                .get_sample_count(),
            1
        );
        assert!(!registry.gather().is_empty());
    }
}
