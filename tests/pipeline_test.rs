//! End-to-end orchestrator runs against in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use genvolt_core::error::{FeedError, SinkError};
use genvolt_core::feed::{parse_feed, FeedClient};
use genvolt_core::model::{ApiKey, DecodedRecord, DeviceMapping, ProtocolVariant, RawFrame, Telemetry};
use genvolt_core::pipeline::{run_pipeline, run_with_context, DeviceOutcome, RunContext};
use genvolt_core::storage::{MemorySink, RecordSink};
use genvolt_core::PipelineConfig;

const P2_PAYLOAD: &str = "7ac5b2e07ecfb7e47dc5b2e17ac5b2e17ac5b2e17ac4d1e17ac5b29a7ac5b2e1";

fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap() + Duration::minutes(minute)
}

fn mapping(device_id: &str, variant: ProtocolVariant) -> DeviceMapping {
    DeviceMapping {
        device_id: device_id.to_string(),
        client_id: 1,
        channel_id: 2_345_678,
        field_id: 3,
        api_key: ApiKey::new("KEY"),
        protocol_variant: variant,
        target_sink: variant.default_table().to_string(),
    }
}

/// Per-device frames; devices listed in `failing` get a transport error.
#[derive(Default)]
struct FakeFeed {
    frames: HashMap<String, Vec<RawFrame>>,
    failing: Vec<String>,
    calls: AtomicUsize,
    since: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl FakeFeed {
    fn with(mut self, device_id: &str, frames: Vec<RawFrame>) -> Self {
        self.frames.insert(device_id.to_string(), frames);
        self
    }

    fn failing(mut self, device_id: &str) -> Self {
        self.failing.push(device_id.to_string());
        self
    }
}

impl FeedClient for FakeFeed {
    fn fetch(&self, mapping: &DeviceMapping, since: DateTime<Utc>) -> Result<Vec<RawFrame>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.since.lock().insert(mapping.device_id.clone(), since);
        if self.failing.contains(&mapping.device_id) {
            return Err(FeedError::Transport("HTTP 503".to_string()));
        }
        Ok(self.frames.get(&mapping.device_id).cloned().unwrap_or_default())
    }
}

/// Sink whose writes always fail.
#[derive(Default)]
struct RejectingSink {
    attempts: AtomicUsize,
}

impl RecordSink for RejectingSink {
    fn last_created_at(&self, _mapping: &DeviceMapping) -> Result<Option<DateTime<Utc>>, SinkError> {
        Ok(Some(t(0)))
    }

    fn write(&self, mapping: &DeviceMapping, _records: &[DecodedRecord]) -> Result<usize, SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Write {
            target: mapping.target_sink.clone(),
            reason: "deadlock victim".to_string(),
        })
    }

    fn commit_watermark(&self, _mapping: &DeviceMapping, _at: DateTime<Utc>) -> Result<(), SinkError> {
        panic!("watermark committed after a failed write");
    }
}

#[test]
fn test_only_frames_newer_than_watermark_are_stored() {
    let device = mapping("4101", ProtocolVariant::P1);
    let sink = MemorySink::new();
    sink.seed_watermark(&device, t(5));

    let feed = FakeFeed::default().with(
        "4101",
        vec![
            RawFrame::new(10, t(7), "60"),
            RawFrame::new(8, t(5), "60"),
            RawFrame::new(6, t(3), "60"),
            RawFrame::new(9, t(6), "1234567890123456"),
        ],
    );

    let report = run_pipeline(&[device.clone()], &feed, &sink, &PipelineConfig::default());
    let device_report = report.device("4101").unwrap();

    assert_eq!(device_report.outcome, DeviceOutcome::Completed);
    assert_eq!(device_report.frames_fetched, 4);
    assert_eq!(device_report.frames_stale, 2);
    assert_eq!(device_report.frames_admitted, 2);
    assert_eq!(device_report.watermark_before, Some(t(5)));
    assert_eq!(device_report.watermark_after, Some(t(7)));
    assert_eq!(feed.since.lock().get("4101"), Some(&t(5)));

    let stored: Vec<u64> = sink.records(&device).iter().map(|r| r.entry_id).collect();
    assert_eq!(stored, vec![9, 10]);
}

#[test]
fn test_rerun_is_idempotent() {
    let device = mapping("4101", ProtocolVariant::P2);
    let sink = MemorySink::new();
    let feed = FakeFeed::default().with(
        "4101",
        vec![RawFrame::new(1, t(1), P2_PAYLOAD), RawFrame::new(2, t(2), P2_PAYLOAD)],
    );
    let config = PipelineConfig::default();

    let first = run_pipeline(&[device.clone()], &feed, &sink, &config);
    let second = run_pipeline(&[device.clone()], &feed, &sink, &config);

    assert_eq!(first.stats.rows_written, 2);
    assert_eq!(second.stats.rows_written, 0);
    assert_eq!(second.stats.frames_stale, 2);
    assert_eq!(sink.len(), 2);
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn test_fetch_failure_leaves_watermark_unchanged() {
    let ok = mapping("4101", ProtocolVariant::P1);
    let down = mapping("4102", ProtocolVariant::P1);
    let sink = MemorySink::new();
    sink.seed_watermark(&down, t(2));

    let feed = FakeFeed::default()
        .with("4101", vec![RawFrame::new(1, t(1), "60")])
        .failing("4102");

    let report = run_pipeline(&[ok.clone(), down.clone()], &feed, &sink, &PipelineConfig::default());

    let failed = report.device("4102").unwrap();
    assert!(matches!(failed.outcome, DeviceOutcome::FetchFailed(_)));
    assert_eq!(failed.watermark_after, Some(t(2)));
    assert_eq!(sink.last_created_at(&down).unwrap(), Some(t(2)));

    assert_eq!(report.device("4101").unwrap().rows_written, 1);
    assert_eq!(report.stats.fetch_calls, 2);
    assert_eq!(report.stats.fetch_failures, 1);
    assert_eq!(report.stats.devices_failed, 1);
}

#[test]
fn test_sink_failure_discards_pending_advance() {
    let device = mapping("4101", ProtocolVariant::P1);
    let sink = RejectingSink::default();
    let feed = FakeFeed::default().with("4101", vec![RawFrame::new(1, t(4), "60")]);

    let report = run_pipeline(&[device], &feed, &sink, &PipelineConfig::default());
    let device_report = report.device("4101").unwrap();

    assert!(matches!(device_report.outcome, DeviceOutcome::SinkFailed(_)));
    assert_eq!(device_report.frames_admitted, 1);
    assert_eq!(device_report.watermark_after, Some(t(0)));
    assert!(!device_report.advanced());
    assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(report.stats.sink_failures, 1);
}

#[test]
fn test_decode_failures_are_isolated_per_frame() {
    let device = mapping("4101", ProtocolVariant::P2);
    let sink = MemorySink::new();
    let feed = FakeFeed::default().with(
        "4101",
        vec![
            RawFrame::new(1, t(1), P2_PAYLOAD),
            RawFrame::new(2, t(2), "1234567890123456"),
            RawFrame::new(3, t(3), "7ac5b2e1"),
            RawFrame::new(4, t(4), P2_PAYLOAD),
        ],
    );

    let report = run_pipeline(&[device.clone()], &feed, &sink, &PipelineConfig::default());
    let device_report = report.device("4101").unwrap();

    assert_eq!(device_report.outcome, DeviceOutcome::Completed);
    assert_eq!(device_report.frames_decoded, 2);
    let failed: Vec<u64> = device_report.failures.iter().map(|f| f.entry_id).collect();
    assert_eq!(failed, vec![2, 3]);
    assert_eq!(report.stats.decode_failures.get("shape"), Some(&2));
    assert_eq!(device_report.watermark_after, Some(t(4)));

    let records = sink.records(&device);
    assert_eq!(records.len(), 2);
    match &records[0].telemetry {
        Telemetry::Operational(op) => {
            assert_eq!(op.motor_current_ma, 99);
            assert_eq!(op.latitude.value(), 1792.0);
        }
        other => panic!("expected operational telemetry, got {:?}", other),
    }
}

#[test]
fn test_undecodable_newest_frame_is_not_retried() {
    let device = mapping("4101", ProtocolVariant::P1);
    let sink = MemorySink::new();
    let feed = FakeFeed::default().with(
        "4101",
        vec![RawFrame::new(1, t(1), "60"), RawFrame::new(2, t(2), "ZZ")],
    );
    let config = PipelineConfig::default();

    let first = run_pipeline(&[device.clone()], &feed, &sink, &config);
    let second = run_pipeline(&[device.clone()], &feed, &sink, &config);

    assert_eq!(first.stats.total_decode_failures(), 1);
    assert_eq!(first.device("4101").unwrap().watermark_after, Some(t(2)));

    let rerun = second.device("4101").unwrap();
    assert_eq!(rerun.watermark_before, Some(t(2)));
    assert_eq!(feed.since.lock().get("4101"), Some(&t(2)));
    assert_eq!(rerun.frames_admitted, 0);
    assert_eq!(second.stats.total_decode_failures(), 0);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_many_devices_on_bounded_pool() {
    let devices: Vec<DeviceMapping> = (0..20)
        .map(|i| mapping(&format!("{}", 5000 + i), ProtocolVariant::P1))
        .collect();

    let mut feed = FakeFeed::default();
    for (i, device) in devices.iter().enumerate() {
        let frames = (0..=i as u64)
            .map(|n| RawFrame::new(n + 1, t(n as i64 + 1), "60"))
            .collect();
        feed = feed.with(&device.device_id, frames);
    }

    let sink = MemorySink::new();
    let config = PipelineConfig::from_json(r#"{"max_workers": 3}"#).unwrap();
    let ctx = RunContext::with_id("run-pool");

    let report = run_with_context(&ctx, &devices, &feed, &sink, &config);

    assert_eq!(report.run_id, "run-pool");
    assert_eq!(report.devices.len(), 20);
    assert_eq!(feed.calls.load(Ordering::SeqCst), 20);
    for (i, device_report) in report.devices.iter().enumerate() {
        assert_eq!(device_report.device_id, devices[i].device_id);
        assert_eq!(device_report.rows_written, i + 1);
    }
    assert_eq!(report.stats.rows_written, (1..=20).sum::<usize>());
    assert_eq!(report.stats.clients, 1);
    assert_eq!(sink.len(), report.stats.rows_written);
}

#[test]
fn test_feed_document_to_sink() {
    let json = r#"{
        "channel": {"id": 2345678},
        "feeds": [
            {"created_at": "2025-03-01T10:02:00Z", "entry_id": 2, "field3": "14232244675774840892"},
            {"created_at": "2025-03-01 10:01:00", "entry_id": 1, "field3": "1234567890123456"},
            {"created_at": "2025-03-01T10:03:00Z", "entry_id": 3, "field3": null}
        ]
    }"#;
    let device = mapping("4101", ProtocolVariant::P1);
    let page = parse_feed(json, &device.field_key()).unwrap();
    assert_eq!(page.skipped_blank, 1);

    let feed = FakeFeed::default().with("4101", page.frames);
    let sink = MemorySink::new();
    let report = run_pipeline(&[device.clone()], &feed, &sink, &PipelineConfig::default());

    assert_eq!(report.stats.rows_written, 2);
    let records = sink.records(&device);
    assert_eq!(records[0].entry_id, 1);
    match &records[1].telemetry {
        Telemetry::Fault(fault) => {
            assert_eq!(fault.runtime_minutes, 60);
            assert_eq!(fault.active_fault_codes, vec![0, 15]);
            assert_eq!(fault.hv_source_no, 3);
        }
        other => panic!("expected fault telemetry, got {:?}", other),
    }
}
