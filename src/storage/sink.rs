//! Record sink interface.

use chrono::{DateTime, Utc};

use crate::error::SinkError;
use crate::model::{DecodedRecord, DeviceMapping};

/// Durable destination for decoded records.
///
/// The sink owns column naming and schema. It also owns the watermark:
/// `last_created_at` seeds each run and `commit_watermark` persists the
/// advance, which may pass the newest stored row when trailing frames
/// failed to decode.
pub trait RecordSink: Send + Sync {
    /// Latest stored `created_at` or committed watermark for the device, if any.
    fn last_created_at(&self, mapping: &DeviceMapping) -> Result<Option<DateTime<Utc>>, SinkError>;

    /// Store `records` in the mapping's target. Returns rows written.
    fn write(&self, mapping: &DeviceMapping, records: &[DecodedRecord]) -> Result<usize, SinkError>;

    /// Persist the device's watermark after a successful write.
    ///
    /// Later `last_created_at` calls must return at least `at`.
    fn commit_watermark(&self, mapping: &DeviceMapping, at: DateTime<Utc>) -> Result<(), SinkError>;
}
