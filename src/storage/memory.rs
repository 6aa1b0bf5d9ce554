//! In-memory record sink.
//!
//! Keeps rows per `(target, device_id)` behind a lock. Used for ad-hoc
//! runs and by the binding layer, where the caller persists rows itself.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::SinkError;
use crate::model::{DecodedRecord, DeviceMapping};

use super::queries::checked_table;
use super::sink::RecordSink;

type SinkKey = (String, String);

/// Thread-safe in-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<HashMap<SinkKey, Vec<DecodedRecord>>>,
    watermarks: RwLock<HashMap<SinkKey, DateTime<Utc>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a device's history, e.g. from a previous run.
    pub fn seed(&self, mapping: &DeviceMapping, records: Vec<DecodedRecord>) {
        self.records
            .write()
            .entry(key(mapping))
            .or_default()
            .extend(records);
    }

    /// Record a watermark persisted elsewhere, e.g. by the caller's database.
    pub fn seed_watermark(&self, mapping: &DeviceMapping, at: DateTime<Utc>) {
        self.watermarks.write().insert(key(mapping), at);
    }

    /// Records stored for a mapping, in write order.
    pub fn records(&self, mapping: &DeviceMapping) -> Vec<DecodedRecord> {
        self.records
            .read()
            .get(&key(mapping))
            .cloned()
            .unwrap_or_default()
    }

    /// Total rows across all targets.
    pub fn len(&self) -> usize {
        self.records.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(mapping: &DeviceMapping) -> SinkKey {
    (mapping.target_sink.clone(), mapping.device_id.clone())
}

impl RecordSink for MemorySink {
    fn last_created_at(&self, mapping: &DeviceMapping) -> Result<Option<DateTime<Utc>>, SinkError> {
        let key = key(mapping);
        let stored = self
            .records
            .read()
            .get(&key)
            .and_then(|records| records.iter().map(|r| r.created_at).max());
        let seeded = self.watermarks.read().get(&key).copied();
        Ok(stored.max(seeded))
    }

    fn write(&self, mapping: &DeviceMapping, records: &[DecodedRecord]) -> Result<usize, SinkError> {
        checked_table(&mapping.target_sink)?;
        if records.is_empty() {
            return Ok(0);
        }

        self.records
            .write()
            .entry(key(mapping))
            .or_default()
            .extend_from_slice(records);
        Ok(records.len())
    }

    fn commit_watermark(&self, mapping: &DeviceMapping, at: DateTime<Utc>) -> Result<(), SinkError> {
        let mut watermarks = self.watermarks.write();
        let current = watermarks.entry(key(mapping)).or_insert(at);
        if at > *current {
            *current = at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_frame;
    use crate::model::{ApiKey, ProtocolVariant, RawFrame};
    use chrono::TimeZone;

    fn mapping(device_id: &str, table: &str) -> DeviceMapping {
        DeviceMapping {
            device_id: device_id.to_string(),
            client_id: 1,
            channel_id: 100,
            field_id: 1,
            api_key: ApiKey::new("k"),
            protocol_variant: ProtocolVariant::P1,
            target_sink: table.to_string(),
        }
    }

    fn record(device_id: &str, entry_id: u64, minute: u32) -> DecodedRecord {
        let frame = RawFrame::new(
            entry_id,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap(),
            "60",
        );
        decode_frame(device_id, ProtocolVariant::P1, &frame).unwrap()
    }

    #[test]
    fn test_write_and_last_created_at() {
        let sink = MemorySink::new();
        let m = mapping("4101", "IoT_Data_New");

        assert_eq!(sink.last_created_at(&m).unwrap(), None);

        let written = sink
            .write(&m, &[record("4101", 1, 7), record("4101", 2, 3)])
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            sink.last_created_at(&m).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 7, 0).unwrap())
        );
        assert_eq!(sink.records(&m).len(), 2);
    }

    #[test]
    fn test_devices_are_isolated() {
        let sink = MemorySink::new();
        let a = mapping("4101", "IoT_Data_New");
        let b = mapping("4102", "IoT_Data_New");

        sink.seed(&a, vec![record("4101", 1, 5)]);
        assert!(sink.last_created_at(&b).unwrap().is_none());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_seeded_watermark() {
        let sink = MemorySink::new();
        let m = mapping("4101", "IoT_Data_New");
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();

        sink.seed_watermark(&m, at);
        sink.write(&m, &[record("4101", 1, 5)]).unwrap();
        assert_eq!(sink.last_created_at(&m).unwrap(), Some(at));
    }

    #[test]
    fn test_committed_watermark_never_moves_back() {
        let sink = MemorySink::new();
        let m = mapping("4101", "IoT_Data_New");
        let later = Utc.with_ymd_and_hms(2025, 3, 1, 10, 9, 0).unwrap();

        sink.write(&m, &[record("4101", 1, 5)]).unwrap();
        sink.commit_watermark(&m, later).unwrap();
        assert_eq!(sink.last_created_at(&m).unwrap(), Some(later));

        sink.commit_watermark(&m, Utc.with_ymd_and_hms(2025, 3, 1, 10, 1, 0).unwrap())
            .unwrap();
        assert_eq!(sink.last_created_at(&m).unwrap(), Some(later));
        assert!(sink.last_created_at(&mapping("4102", "IoT_Data_New")).unwrap().is_none());
    }

    #[test]
    fn test_invalid_target_rejected() {
        let sink = MemorySink::new();
        let m = mapping("4101", "bad table");
        assert!(matches!(
            sink.write(&m, &[record("4101", 1, 5)]),
            Err(SinkError::InvalidTarget(_))
        ));
        assert!(sink.is_empty());
    }
}
