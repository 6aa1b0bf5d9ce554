//! Main telemetry ingestion pipeline.
//!
//! Coordinates the per-device workflow:
//! 1. Watermark seed (latest stored `created_at` from the sink)
//! 2. Feed fetch of entries newer than the watermark
//! 3. Ordering by `(observed_at, entry_id)`
//! 4. Cursor admission (stale and duplicate frames dropped)
//! 5. Decode with the mapping's protocol variant
//! 6. Sink write, then watermark commit through the sink
//!
//! Devices are independent and run on a bounded worker pool.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use chrono::Utc;
use parking_lot::Mutex;

use crate::config::PipelineConfig;
use crate::cursor::IngestionCursor;
use crate::decoder::decode_frame;
use crate::feed::FeedClient;
use crate::logging::structured::LogContext;
use crate::model::{DecodedRecord, DeviceMapping, Telemetry};
use crate::storage::RecordSink;

use super::context::RunContext;
use super::stats::{DeviceOutcome, DeviceReport, FrameFailure, RunReport, RunStats};

/// Run every mapping once under a fresh run id.
pub fn run_pipeline(
    mappings: &[DeviceMapping],
    feed: &dyn FeedClient,
    sink: &dyn RecordSink,
    config: &PipelineConfig,
) -> RunReport {
    run_with_context(&RunContext::new(), mappings, feed, sink, config)
}

/// Run every mapping once.
///
/// At most `config.max_workers` devices are in flight. Reports come back in
/// mapping order.
pub fn run_with_context(
    ctx: &RunContext,
    mappings: &[DeviceMapping],
    feed: &dyn FeedClient,
    sink: &dyn RecordSink,
    config: &PipelineConfig,
) -> RunReport {
    let log_ctx = ctx.log_context();
    let workers = config.max_workers.max(1).min(mappings.len().max(1));

    crate::log_info!(
        log_ctx,
        "RUN_START",
        devices = mappings.len(),
        workers = workers,
        epoch_start = config.epoch_start.to_rfc3339()
    );

    let next = AtomicUsize::new(0);
    let results: Mutex<Vec<(usize, DeviceReport)>> = Mutex::new(Vec::with_capacity(mappings.len()));

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(mapping) = mappings.get(index) else {
                    break;
                };
                let report = process_device(ctx, mapping, feed, sink, config);
                results.lock().push((index, report));
            });
        }
    });

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);
    let devices: Vec<DeviceReport> = results.into_iter().map(|(_, report)| report).collect();

    let report = RunReport {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at,
        finished_at: Utc::now(),
        stats: RunStats::from_devices(&devices),
        devices,
    };

    crate::log_info!(
        log_ctx,
        "RUN_COMPLETE",
        devices = report.stats.devices_processed,
        failed = report.stats.devices_failed,
        admitted = report.stats.frames_admitted,
        written = report.stats.rows_written
    );
    for line in report.summary_lines() {
        crate::log_info!(log_ctx, "RUN_SUMMARY", row = line);
    }

    report
}

/// Fetch, filter, decode and store one device's new frames.
///
/// Never panics on bad input and never returns an error: every failure is
/// recorded on the returned report.
pub fn process_device(
    ctx: &RunContext,
    mapping: &DeviceMapping,
    feed: &dyn FeedClient,
    sink: &dyn RecordSink,
    config: &PipelineConfig,
) -> DeviceReport {
    let log_ctx = ctx.device_context(&mapping.device_id).log_context();
    let mut report = DeviceReport::new(&mapping.device_id, mapping.client_id);

    crate::log_debug!(
        log_ctx,
        "DEVICE_START",
        variant = mapping.protocol_variant,
        channel = mapping.channel_id,
        field = mapping.field_id,
        target = mapping.target_sink
    );

    // [1] WATERMARK SEED
    let last_seen_at = match sink.last_created_at(mapping) {
        Ok(last) => last,
        Err(e) => {
            crate::log_error!(log_ctx, "WATERMARK_LOOKUP_FAILED", error = e);
            report.outcome = DeviceOutcome::Skipped(e.to_string());
            return report;
        }
    };
    let mut cursor = IngestionCursor::new(&mapping.device_id, last_seen_at, config.epoch_start);
    report.watermark_before = Some(cursor.watermark());
    report.watermark_after = report.watermark_before;

    if !cursor.has_history() {
        crate::log_info!(log_ctx, "DEVICE_NO_HISTORY", floor = cursor.watermark().to_rfc3339());
    }

    // [2] FETCH
    let mut frames = match feed.fetch(mapping, cursor.watermark()) {
        Ok(frames) => frames,
        Err(e) => {
            crate::log_warn!(
                log_ctx,
                "FEED_FETCH_FAILED",
                error = e,
                watermark = cursor.watermark().to_rfc3339()
            );
            report.outcome = DeviceOutcome::FetchFailed(e.to_string());
            return report;
        }
    };
    report.frames_fetched = frames.len();

    // [3] ORDER
    frames.sort_by(|a, b| (a.observed_at, a.entry_id).cmp(&(b.observed_at, b.entry_id)));

    // [4] ADMIT + [5] DECODE
    let mut records: Vec<DecodedRecord> = Vec::new();
    for frame in &frames {
        if !cursor.is_newer(frame) {
            report.frames_stale += 1;
            crate::log_debug!(
                log_ctx.with_entry(frame.entry_id),
                "FRAME_STALE",
                observed_at = frame.observed_at.to_rfc3339()
            );
            continue;
        }
        if !cursor.admit(frame) {
            report.frames_duplicate += 1;
            crate::log_debug!(log_ctx.with_entry(frame.entry_id), "FRAME_DUPLICATE");
            continue;
        }
        report.frames_admitted += 1;

        match decode_frame(&mapping.device_id, mapping.protocol_variant, frame) {
            Ok(record) => {
                check_identity(&log_ctx, mapping, &record);
                records.push(record);
            }
            Err(e) => {
                crate::log_warn!(
                    log_ctx.with_entry(frame.entry_id),
                    "FRAME_DECODE_FAILED",
                    kind = e.kind(),
                    error = e
                );
                report.failures.push(FrameFailure {
                    entry_id: frame.entry_id,
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }
    }
    report.frames_decoded = records.len();

    // [6] WRITE + COMMIT
    if !records.is_empty() {
        match sink.write(mapping, &records) {
            Ok(written) => report.rows_written = written,
            Err(e) => {
                crate::log_error!(
                    log_ctx,
                    "SINK_WRITE_FAILED",
                    error = e,
                    rows = records.len()
                );
                cursor.discard();
                report.outcome = DeviceOutcome::SinkFailed(e.to_string());
                return report;
            }
        }
    }

    let watermark = cursor.commit();
    if Some(watermark) > report.watermark_before {
        if let Err(e) = sink.commit_watermark(mapping, watermark) {
            crate::log_error!(
                log_ctx,
                "WATERMARK_COMMIT_FAILED",
                error = e,
                watermark = watermark.to_rfc3339()
            );
            let stored = records.iter().map(|r| r.created_at).max();
            report.watermark_after = report.watermark_before.max(stored);
            report.outcome = DeviceOutcome::SinkFailed(e.to_string());
            return report;
        }
    }
    report.watermark_after = Some(watermark);

    crate::log_info!(
        log_ctx,
        "DEVICE_COMPLETE",
        fetched = report.frames_fetched,
        admitted = report.frames_admitted,
        stale = report.frames_stale,
        decode_failures = report.failures.len(),
        written = report.rows_written,
        watermark = watermark.to_rfc3339()
    );

    report
}

/// Log when a P2 frame reports an identity other than its mapping's.
fn check_identity(log_ctx: &LogContext, mapping: &DeviceMapping, record: &DecodedRecord) {
    if let Telemetry::Operational(t) = &record.telemetry {
        let reported = t.reported_identity.to_string();
        if reported != mapping.device_id {
            crate::log_debug!(
                log_ctx.with_entry(record.entry_id),
                "DEVICE_IDENTITY_MISMATCH",
                reported = reported
            );
        }
    }
}
