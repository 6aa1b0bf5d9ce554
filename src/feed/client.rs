//! Feed client interface.

use chrono::{DateTime, Utc};

use crate::error::FeedError;
use crate::model::{DeviceMapping, RawFrame};

use super::document::FeedPage;

/// Source of raw frames for a device.
///
/// Implementations own transport, retries and timeouts. They may return
/// frames at or before `since`; the cursor filters those out. A failed
/// fetch must be reported as an error, never as an empty page.
pub trait FeedClient: Send + Sync {
    fn fetch(&self, mapping: &DeviceMapping, since: DateTime<Utc>)
        -> Result<Vec<RawFrame>, FeedError>;
}

/// Feed over frames already fetched by the caller.
///
/// Returns the same frames for every mapping and watermark.
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    frames: Vec<RawFrame>,
}

impl StaticFeed {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self { frames }
    }
}

impl From<FeedPage> for StaticFeed {
    fn from(page: FeedPage) -> Self {
        Self::new(page.frames)
    }
}

impl FeedClient for StaticFeed {
    fn fetch(
        &self,
        _mapping: &DeviceMapping,
        _since: DateTime<Utc>,
    ) -> Result<Vec<RawFrame>, FeedError> {
        Ok(self.frames.clone())
    }
}
