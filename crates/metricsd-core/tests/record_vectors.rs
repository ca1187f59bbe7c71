//! Metric record vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metricsd_core::protocol::{MetricRecord, MetricUpdate};

mod vector_loader;
use vector_loader::load;

#[test]
fn record_vectors() {
    let files = [
        "gauge_ok.json",
        "counter_ok.json",
        "gauge_missing_value.json",
        "counter_missing_delta.json",
        "unknown_kind.json",
        "empty_id.json",
    ];

    for f in files {
        let v = load(f);
        let rec: MetricRecord = serde_json::from_value(v.record.clone())
            .unwrap_or_else(|e| panic!("vector={} does not parse: {e}", v.description));
        let res = rec.to_update();

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let update = res.expect("expected valid update");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(
            update.kind().as_str(),
            ex["kind"].as_str().unwrap(),
            "vector={}",
            v.description
        );
        assert_eq!(update.name(), ex["name"].as_str().unwrap(), "vector={}", v.description);
        match update {
            MetricUpdate::Gauge { value, .. } => {
                assert_eq!(value, ex["value"].as_f64().unwrap(), "vector={}", v.description)
            }
            MetricUpdate::Counter { delta, .. } => {
                assert_eq!(delta, ex["delta"].as_i64().unwrap(), "vector={}", v.description)
            }
        }
    }
}

#[test]
fn serialized_gauge_omits_delta() {
    let json = serde_json::to_value(MetricRecord::gauge("g1", 1.5)).unwrap();
    assert_eq!(json, serde_json::json!({ "id": "g1", "type": "gauge", "value": 1.5 }));
}

#[test]
fn serialized_counter_omits_value() {
    let json = serde_json::to_value(MetricRecord::counter("c1", 7)).unwrap();
    assert_eq!(json, serde_json::json!({ "id": "c1", "type": "counter", "delta": 7 }));
}

#[test]
fn unknown_kind_in_array_does_not_fail_document() {
    let raw = r#"[
        {"id":"g1","type":"gauge","value":1.0},
        {"id":"x","type":"summary","value":2.0}
    ]"#;
    let batch: Vec<MetricRecord> = serde_json::from_str(raw).unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch[0].to_update().is_ok());
    assert_eq!(
        batch[1].to_update().unwrap_err().client_code().as_str(),
        "INVALID_KIND"
    );
}
