//! Feed document parsing.
//!
//! Parses the channel-field JSON returned by the feed service:
//!
//! ```json
//! { "channel": { "id": 2345678 },
//!   "feeds": [ { "entry_id": 1, "created_at": "2025-03-01T10:00:00Z", "field10": "7ac5..." } ] }
//! ```

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::FeedError;
use crate::model::{parse_timestamp, RawFrame};

#[derive(Debug, Deserialize)]
struct FeedDocument {
    #[serde(default)]
    feeds: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    entry_id: u64,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(flatten)]
    fields: HashMap<String, Value>,
}

/// Frames extracted from one feed document.
#[derive(Debug, Default)]
pub struct FeedPage {
    pub frames: Vec<RawFrame>,
    /// Entries with an absent, null or blank field value.
    pub skipped_blank: usize,
    /// Entries whose timestamp could not be parsed.
    pub skipped_invalid: usize,
}

/// Parse a feed document, taking payloads from `field_key` (`field<N>`).
pub fn parse_feed(json: &str, field_key: &str) -> Result<FeedPage, FeedError> {
    let document: FeedDocument = serde_json::from_str(json)?;
    let mut page = FeedPage::default();

    for entry in document.feeds {
        let payload = match entry.fields.get(field_key).and_then(field_text) {
            Some(p) => p,
            None => {
                page.skipped_blank += 1;
                continue;
            }
        };

        let observed_at = match entry.created_at.as_deref().map(parse_timestamp) {
            Some(Ok(ts)) => ts,
            _ => {
                log::debug!(
                    "FEED_ENTRY_INVALID_TIMESTAMP entry_id={} created_at={:?}",
                    entry.entry_id,
                    entry.created_at
                );
                page.skipped_invalid += 1;
                continue;
            }
        };

        page.frames.push(RawFrame::new(entry.entry_id, observed_at, payload));
    }

    Ok(page)
}

/// Text of a field value; numbers keep their decimal rendering.
fn field_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
