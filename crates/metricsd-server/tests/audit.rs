#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use httpmock::Method::POST;
use httpmock::MockServer;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use metricsd_core::error::{MetricsError, Result};
use metricsd_core::protocol::AuditEvent;
use metricsd_server::audit::{AuditSink, Auditor, Clock, DeliveryReport, FileSink, HttpSink};
use metricsd_server::obs::metrics::ServerMetrics;

struct FixedClock {
    ts: i64,
    calls: AtomicUsize,
}

impl FixedClock {
    fn new(ts: i64) -> Arc<Self> {
        Arc::new(Self {
            ts,
            calls: AtomicUsize::new(0),
        })
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ts
    }
}

fn shared<S: AuditSink + 'static>(sink: S) -> Arc<dyn AuditSink> {
    Arc::new(sink)
}

struct ChannelSink(mpsc::UnboundedSender<AuditEvent>);

#[async_trait]
impl AuditSink for ChannelSink {
    fn name(&self) -> &str {
        "channel"
    }
    async fn send(&self, ev: &AuditEvent) -> Result<()> {
        let _ = self.0.send(ev.clone());
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl AuditSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }
    async fn send(&self, _ev: &AuditEvent) -> Result<()> {
        Err(MetricsError::Internal("sink down".into()))
    }
}

struct HangingSink;

#[async_trait]
impl AuditSink for HangingSink {
    fn name(&self) -> &str {
        "hanging"
    }
    async fn send(&self, _ev: &AuditEvent) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

#[tokio::test]
async fn zero_sinks_is_a_no_op() {
    let clock = FixedClock::new(1);
    let auditor = Arc::new(Auditor::new(Vec::new()).with_clock(clock.clone()));

    assert!(!auditor.enabled());
    let report = auditor.notify(vec!["g1".into()], "10.0.0.1").await;
    assert_eq!(report, DeliveryReport::default());
    assert!(auditor.dispatch(vec!["g1".into()], "10.0.0.1".into()).is_none());
    assert_eq!(clock.calls.load(Ordering::SeqCst), 0, "no event must be built");
}

#[tokio::test]
async fn event_fans_out_to_every_sink() {
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let auditor = Auditor::new(vec![shared(ChannelSink(tx1)), shared(ChannelSink(tx2))])
        .with_clock(FixedClock::new(1_700_000_000));

    let report = auditor
        .notify(vec!["g1".into(), "c1".into()], "192.0.2.10")
        .await;
    assert_eq!(report, DeliveryReport { delivered: 2, failed: 0 });

    let expected = AuditEvent::new(1_700_000_000, vec!["g1".into(), "c1".into()], "192.0.2.10");
    assert_eq!(rx1.recv().await.unwrap(), expected);
    assert_eq!(rx2.recv().await.unwrap(), expected);
}

#[tokio::test]
async fn failing_sink_is_swallowed_and_others_still_receive() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let metrics = Arc::new(ServerMetrics::default());
    let auditor = Auditor::new(vec![shared(FailingSink), shared(ChannelSink(tx))])
        .with_metrics(Arc::clone(&metrics));

    let report = auditor.notify(vec!["c1".into()], "").await;
    assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
    assert_eq!(rx.recv().await.unwrap().metrics, vec!["c1".to_string()]);
    assert_eq!(
        metrics.audit_deliveries.get(&[("sink", "failing"), ("result", "error")]),
        1
    );
    assert_eq!(
        metrics.audit_deliveries.get(&[("sink", "channel"), ("result", "ok")]),
        1
    );
}

#[tokio::test]
async fn hanging_sink_is_bounded_by_timeout() {
    let auditor = Auditor::new(vec![shared(HangingSink)]).with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let report = auditor.notify(vec!["g1".into()], "").await;
    assert_eq!(report, DeliveryReport { delivered: 0, failed: 1 });
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn cancel_aborts_in_flight_delivery() {
    let cancel = CancellationToken::new();
    let auditor = Arc::new(
        Auditor::new(vec![shared(HangingSink)])
            .with_timeout(Duration::from_secs(60))
            .with_cancel(cancel.clone()),
    );

    let handle = auditor
        .dispatch(vec!["g1".into()], "".into())
        .expect("enabled auditor must spawn");
    tokio::time::sleep(Duration::from_millis(20)).await;
    cancel.cancel();

    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("delivery must stop on cancel")
        .unwrap();
    assert_eq!(report.failed, 1);
}

#[tokio::test]
async fn file_sink_appends_one_json_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    let auditor = Arc::new(
        Auditor::new(vec![shared(FileSink::new(&path))]).with_clock(FixedClock::new(42)),
    );

    let handles: Vec<_> = (0..20)
        .map(|i| {
            auditor
                .dispatch(vec![format!("m{i}")], "127.0.0.1".into())
                .unwrap()
        })
        .collect();
    for h in handles {
        assert_eq!(h.await.unwrap().delivered, 1);
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 20);
    for line in lines {
        let ev: AuditEvent = serde_json::from_str(line).unwrap();
        assert_eq!(ev.ts, 42);
        assert_eq!(ev.ip_address, "127.0.0.1");
        assert_eq!(ev.metrics.len(), 1);
    }
}

#[tokio::test]
async fn file_sink_reports_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::new(dir.path().join("missing").join("audit.jsonl"));
    let ev = AuditEvent::new(1, vec!["g1".into()], "");
    assert!(sink.send(&ev).await.is_err());
}

#[tokio::test]
async fn http_sink_posts_event_json() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/audit")
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "ts": 1_700_000_000,
                    "metrics": ["g1", "c1"],
                    "ip_address": "192.0.2.10"
                }));
            then.status(200);
        })
        .await;

    let sink = HttpSink::new(server.url("/audit"), Duration::from_secs(2)).unwrap();
    let ev = AuditEvent::new(1_700_000_000, vec!["g1".into(), "c1".into()], "192.0.2.10");
    sink.send(&ev).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn http_sink_treats_error_status_as_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/audit");
            then.status(500);
        })
        .await;

    let sink = HttpSink::new(server.url("/audit"), Duration::from_secs(2)).unwrap();
    let auditor = Auditor::new(vec![shared(sink)]);
    let report = auditor.notify(vec!["g1".into()], "").await;
    assert_eq!(report, DeliveryReport { delivered: 0, failed: 1 });
}

#[tokio::test]
async fn http_sink_unreachable_endpoint_does_not_error_the_caller() {
    // port 9 (discard) on localhost is not expected to accept HTTP
    let sink = HttpSink::new("http://127.0.0.1:9/audit", Duration::from_millis(500)).unwrap();
    let auditor = Auditor::new(vec![shared(sink)]).with_timeout(Duration::from_secs(1));

    let started = Instant::now();
    let report = auditor.notify(vec!["g1".into()], "").await;
    assert_eq!(report.failed, 1);
    assert!(started.elapsed() < Duration::from_secs(3));
}
