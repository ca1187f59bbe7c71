//! Path-form update parsing.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metricsd_core::protocol::{parse_text_update, MetricUpdate};

#[test]
fn parses_gauge_and_counter() {
    assert_eq!(
        parse_text_update("gauge", "testGauge", "42.5").unwrap(),
        MetricUpdate::Gauge { name: "testGauge".into(), value: 42.5 }
    );
    assert_eq!(
        parse_text_update("counter", "testCounter", "5").unwrap(),
        MetricUpdate::Counter { name: "testCounter".into(), delta: 5 }
    );
}

#[test]
fn rejects_bad_input() {
    let cases = [
        ("unknown", "test", "123", "INVALID_KIND"),
        ("gauge", "test", "invalid", "INVALID_VALUE"),
        ("gauge", "test", "NaN", "INVALID_VALUE"),
        ("counter", "test", "1.5", "INVALID_VALUE"),
        ("gauge", "", "1", "MISSING_FIELD"),
    ];
    for (kind, name, raw, code) in cases {
        let err = parse_text_update(kind, name, raw).expect_err("must fail");
        assert_eq!(err.client_code().as_str(), code, "case={kind}/{name}/{raw}");
    }
}
