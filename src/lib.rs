//! GenVolt Core - Telemetry frame decoding and incremental ingestion
//!
//! This crate decodes the hex payloads reported by GenVolt field devices
//! and forwards each new reading to a sink exactly once per watermark
//! advance. The implementation prioritizes:
//!
//! 1. **Determinism** - Decoding is a pure function of payload and variant
//! 2. **Logging** - Every decision point logged with full context
//! 3. **Isolation** - A bad frame or device never aborts its siblings
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `codec` - Hex/bit primitives (chunking, XOR, fixed-width binary)
//! - `decoder` - P1 and P2 frame decoders and variant dispatch
//! - `cursor` - Per-device watermark and admission
//! - `pipeline` - Orchestrator: fetch, filter, decode, store per device
//! - `feed` - Feed client interface and feed document parsing
//! - `storage` - Sink interface, column mapping and SQL query builders
//! - `model` - Device mappings, raw frames and decoded records
//! - `config` - Run configuration
//! - `logging` - Structured logging with run/device context
//!
//! The `python` feature exposes the decoder and a single-device ingest
//! to Python via PyO3.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod feed;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod storage;

#[cfg(feature = "python")]
mod python;

pub use config::PipelineConfig;
pub use cursor::IngestionCursor;
pub use decoder::{decode, decode_frame};
pub use error::{DecodeError, FormatError, ShapeError};
pub use feed::FeedClient;
pub use model::{DecodedRecord, DeviceMapping, ProtocolVariant, RawFrame, Telemetry};
pub use pipeline::{run_pipeline, RunReport};
pub use storage::RecordSink;

/// Initialize the process logger.
///
/// Safe to call more than once; only the first call installs the logger.
/// `RUST_LOG` directives take precedence over `level`.
pub fn init_logger(level: log::LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
