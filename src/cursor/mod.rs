//! Ingestion cursor module.
//!
//! Per-device high-water-mark tracking. A frame is forwarded only if it is
//! strictly newer than everything already durably stored for its device.

pub mod watermark;

pub use watermark::*;
