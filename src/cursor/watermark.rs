//! Per-device watermark.
//!
//! Admission is checked against the committed watermark only. Admitted
//! frames raise a pending mark, which becomes the watermark on `commit`
//! once the sink has accepted the batch. `discard` drops the pending mark
//! so a failed write leaves the watermark where it was.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::RawFrame;

/// Incremental-fetch cursor for one device.
///
/// Owned by the single task processing that device; not shared.
#[derive(Debug, Clone)]
pub struct IngestionCursor {
    device_id: String,
    last_seen_at: Option<DateTime<Utc>>,
    floor: DateTime<Utc>,
    pending: Option<DateTime<Utc>>,
    admitted: HashSet<(u64, DateTime<Utc>)>,
}

impl IngestionCursor {
    /// Seed from the latest stored `created_at`, or `floor` when none exists.
    pub fn new(device_id: &str, last_seen_at: Option<DateTime<Utc>>, floor: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.to_string(),
            last_seen_at,
            floor,
            pending: None,
            admitted: HashSet::new(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Latest durably ingested timestamp, or the floor.
    pub fn watermark(&self) -> DateTime<Utc> {
        self.last_seen_at.unwrap_or(self.floor)
    }

    /// True if the device had stored data when the cursor was seeded.
    pub fn has_history(&self) -> bool {
        self.last_seen_at.is_some()
    }

    /// Highest timestamp admitted since the last commit.
    pub fn pending(&self) -> Option<DateTime<Utc>> {
        self.pending
    }

    /// Admit `frame` iff it is strictly newer than the watermark and has not
    /// already been admitted in this run.
    pub fn admit(&mut self, frame: &RawFrame) -> bool {
        if !self.is_newer(frame) {
            return false;
        }
        if !self.admitted.insert((frame.entry_id, frame.observed_at)) {
            return false;
        }
        self.pending = Some(match self.pending {
            Some(current) => current.max(frame.observed_at),
            None => frame.observed_at,
        });
        true
    }

    /// True if `frame` is strictly after the watermark.
    pub fn is_newer(&self, frame: &RawFrame) -> bool {
        frame.observed_at > self.watermark()
    }

    /// Advance the watermark to the pending mark. Returns the new watermark.
    pub fn commit(&mut self) -> DateTime<Utc> {
        if let Some(pending) = self.pending.take() {
            self.last_seen_at = Some(match self.last_seen_at {
                Some(current) => current.max(pending),
                None => pending,
            });
        }
        self.admitted.clear();
        self.watermark()
    }

    /// Drop the pending mark without moving the watermark.
    pub fn discard(&mut self) {
        self.pending = None;
        self.admitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap()
    }

    fn frame(entry_id: u64, at: DateTime<Utc>) -> RawFrame {
        RawFrame::new(entry_id, at, "1234")
    }

    fn floor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_admit_is_strict() {
        let mut cursor = IngestionCursor::new("dev-1", Some(t(5)), floor());

        assert!(!cursor.admit(&frame(1, t(4))));
        assert!(!cursor.admit(&frame(2, t(5))));
        assert!(cursor.admit(&frame(3, t(5) + Duration::milliseconds(1))));
    }

    #[test]
    fn test_watermark_is_max_of_admitted() {
        let mut cursor = IngestionCursor::new("dev-1", Some(t(0)), floor());

        assert!(cursor.admit(&frame(1, t(1))));
        assert!(cursor.admit(&frame(3, t(3))));
        assert!(cursor.admit(&frame(2, t(2))));

        assert_eq!(cursor.pending(), Some(t(3)));
        assert_eq!(cursor.watermark(), t(0));
        assert_eq!(cursor.commit(), t(3));
        assert_eq!(cursor.watermark(), t(3));
    }

    #[test]
    fn test_stale_frames_do_not_move_watermark() {
        let mut cursor = IngestionCursor::new("dev-1", Some(t(10)), floor());

        assert!(!cursor.admit(&frame(1, t(2))));
        assert_eq!(cursor.pending(), None);
        assert_eq!(cursor.commit(), t(10));
    }

    #[test]
    fn test_duplicate_within_run_rejected() {
        let mut cursor = IngestionCursor::new("dev-1", None, floor());

        assert!(cursor.admit(&frame(7, t(1))));
        assert!(!cursor.admit(&frame(7, t(1))));
        // Same timestamp, different entry: a distinct reading
        assert!(cursor.admit(&frame(8, t(1))));
    }

    #[test]
    fn test_floor_when_no_history() {
        let cursor = IngestionCursor::new("dev-1", None, floor());
        assert!(!cursor.has_history());
        assert_eq!(cursor.watermark(), floor());
        assert!(!cursor.is_newer(&frame(1, floor())));
        assert!(cursor.is_newer(&frame(1, floor() + Duration::seconds(1))));
    }

    #[test]
    fn test_discard_keeps_watermark() {
        let mut cursor = IngestionCursor::new("dev-1", Some(t(0)), floor());

        assert!(cursor.admit(&frame(1, t(4))));
        cursor.discard();
        assert_eq!(cursor.pending(), None);
        assert_eq!(cursor.commit(), t(0));

        // Discarded frames are admissible again on retry
        assert!(cursor.admit(&frame(1, t(4))));
    }
}
