//! Pipeline orchestration module.
//!
//! Main ingestion pipeline that coordinates, per device:
//! - Watermark seeding from the sink
//! - Feed fetch
//! - Cursor admission
//! - Frame decoding
//! - Sink write and watermark commit

pub mod context;
pub mod ingestion;
pub mod stats;

pub use context::*;
pub use ingestion::*;
pub use stats::*;
