#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use metricsd::core::{MetricKind, MetricRecord};
use metricsd::server::audit::Auditor;
use metricsd::server::obs::metrics::ServerMetrics;
use metricsd::server::pipeline::UpdatePipeline;
use metricsd::server::storage::MemStorage;

#[test]
fn facade_exposes_a_working_pipeline() {
    let pipeline = UpdatePipeline::new(
        Arc::new(MemStorage::new()),
        Arc::new(Auditor::new(Vec::new())),
        Arc::new(ServerMetrics::default()),
    );

    pipeline.update_one(&MetricRecord::counter("hits", 2), "10.0.0.1").unwrap();
    let stored = pipeline.update_one(&MetricRecord::counter("hits", 3), "10.0.0.1").unwrap();
    assert_eq!(stored.delta, Some(5));
    assert_eq!(
        pipeline.read_one("hits", MetricKind::Counter),
        Some(MetricRecord::counter("hits", 5))
    );
}
