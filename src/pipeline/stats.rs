//! Run reporting.
//!
//! Counters and per-device outcomes for one orchestrator run. A report is
//! built by the run and returned to the caller; nothing is kept globally.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a device's processing ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeviceOutcome {
    /// Fetched, filtered and written; the watermark may have advanced.
    Completed,
    /// Watermark lookup failed; nothing fetched.
    Skipped(String),
    /// Fetch failed; watermark unchanged.
    FetchFailed(String),
    /// Sink rejected the batch; watermark unchanged.
    SinkFailed(String),
}

impl DeviceOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, DeviceOutcome::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceOutcome::Completed => "completed",
            DeviceOutcome::Skipped(_) => "skipped",
            DeviceOutcome::FetchFailed(_) => "fetch_failed",
            DeviceOutcome::SinkFailed(_) => "sink_failed",
        }
    }
}

/// A frame that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameFailure {
    pub entry_id: u64,
    pub kind: &'static str,
    pub error: String,
}

/// Per-device counters and outcome.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    pub device_id: String,
    pub client_id: i64,
    pub watermark_before: Option<DateTime<Utc>>,
    pub watermark_after: Option<DateTime<Utc>>,
    pub outcome: DeviceOutcome,
    pub frames_fetched: usize,
    pub frames_admitted: usize,
    pub frames_stale: usize,
    pub frames_duplicate: usize,
    pub frames_decoded: usize,
    pub rows_written: usize,
    pub failures: Vec<FrameFailure>,
}

impl DeviceReport {
    pub fn new(device_id: &str, client_id: i64) -> Self {
        Self {
            device_id: device_id.to_string(),
            client_id,
            watermark_before: None,
            watermark_after: None,
            outcome: DeviceOutcome::Completed,
            frames_fetched: 0,
            frames_admitted: 0,
            frames_stale: 0,
            frames_duplicate: 0,
            frames_decoded: 0,
            rows_written: 0,
            failures: Vec::new(),
        }
    }

    /// True if the watermark moved during this run.
    pub fn advanced(&self) -> bool {
        self.watermark_after > self.watermark_before
    }
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub clients: usize,
    pub devices_processed: usize,
    pub devices_failed: usize,
    pub fetch_calls: usize,
    pub fetch_failures: usize,
    pub frames_fetched: usize,
    pub frames_admitted: usize,
    pub frames_stale: usize,
    pub frames_duplicate: usize,
    pub frames_decoded: usize,
    pub decode_failures: BTreeMap<&'static str, usize>,
    pub rows_written: usize,
    pub sink_failures: usize,
}

impl RunStats {
    /// Fold per-device reports into run totals.
    pub fn from_devices(devices: &[DeviceReport]) -> Self {
        let mut stats = RunStats::default();
        let mut clients = BTreeSet::new();

        for device in devices {
            clients.insert(device.client_id);
            stats.devices_processed += 1;
            if device.outcome.is_failure() {
                stats.devices_failed += 1;
            }
            match &device.outcome {
                DeviceOutcome::Skipped(_) => {}
                DeviceOutcome::FetchFailed(_) => {
                    stats.fetch_calls += 1;
                    stats.fetch_failures += 1;
                }
                DeviceOutcome::SinkFailed(_) => {
                    stats.fetch_calls += 1;
                    stats.sink_failures += 1;
                }
                DeviceOutcome::Completed => stats.fetch_calls += 1,
            }

            stats.frames_fetched += device.frames_fetched;
            stats.frames_admitted += device.frames_admitted;
            stats.frames_stale += device.frames_stale;
            stats.frames_duplicate += device.frames_duplicate;
            stats.frames_decoded += device.frames_decoded;
            stats.rows_written += device.rows_written;
            for failure in &device.failures {
                *stats.decode_failures.entry(failure.kind).or_insert(0) += 1;
            }
        }

        stats.clients = clients.len();
        stats
    }

    pub fn total_decode_failures(&self) -> usize {
        self.decode_failures.values().sum()
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub devices: Vec<DeviceReport>,
    pub stats: RunStats,
}

impl RunReport {
    pub fn device(&self, device_id: &str) -> Option<&DeviceReport> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }

    /// Metric/value table for the end-of-run log.
    pub fn summary_lines(&self) -> Vec<String> {
        let s = &self.stats;
        let duration_ms = (self.finished_at - self.started_at).num_milliseconds();

        let mut rows: Vec<(String, String)> = vec![
            ("Run".to_string(), self.run_id.clone()),
            ("Duration (ms)".to_string(), duration_ms.to_string()),
            ("Clients".to_string(), s.clients.to_string()),
            ("Devices processed".to_string(), s.devices_processed.to_string()),
            ("Devices failed".to_string(), s.devices_failed.to_string()),
            ("Fetch calls".to_string(), s.fetch_calls.to_string()),
            ("Fetch failures".to_string(), s.fetch_failures.to_string()),
            ("Frames fetched".to_string(), s.frames_fetched.to_string()),
            ("Frames admitted".to_string(), s.frames_admitted.to_string()),
            ("Frames stale".to_string(), s.frames_stale.to_string()),
            ("Frames duplicate".to_string(), s.frames_duplicate.to_string()),
            ("Frames decoded".to_string(), s.frames_decoded.to_string()),
        ];
        for (kind, count) in &s.decode_failures {
            rows.push((format!("Decode failures ({})", kind), count.to_string()));
        }
        rows.push(("Rows written".to_string(), s.rows_written.to_string()));
        rows.push(("Sink failures".to_string(), s.sink_failures.to_string()));

        let width = rows.iter().map(|(m, _)| m.len()).max().unwrap_or(0);
        rows.into_iter()
            .map(|(metric, value)| format!("{:<width$} | {}", metric, value, width = width))
            .collect()
    }
}
