//! Error taxonomy.
//!
//! Decode failures are frame-scoped: a `DecodeError` is recorded against the
//! device's run and processing continues with the next frame.

use thiserror::Error;

/// Malformed input to a codec primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("invalid hex value: {0:?}")]
    InvalidHex(String),

    #[error("invalid decimal value: {0:?}")]
    InvalidDecimal(String),

    #[error("value {value:?} does not fit in {bits} bits")]
    Overflow { value: String, bits: u32 },

    #[error("value {value:#x} needs {needed} bits, width is {width}")]
    WidthTooNarrow { value: u64, needed: u32, width: usize },

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Payload shape does not satisfy the frame layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("empty payload")]
    EmptyPayload,

    #[error("too few chunks: expected at least {expected}, got {actual}")]
    TooFewChunks { expected: usize, actual: usize },

    #[error("payload length {len} is not a multiple of {chunk_size}")]
    RaggedChunk { len: usize, chunk_size: usize },

    #[error("payload shape contradicts configured variant {variant}")]
    VariantMismatch { variant: &'static str },
}

/// Failure to decode a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
}

impl DecodeError {
    /// Short label used in logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::Format(_) => "format",
            DecodeError::Shape(_) => "shape",
        }
    }
}

/// Invalid device mapping row from the external mapping source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("unknown conversion logic id {0}")]
    UnknownVariant(i64),

    #[error("unknown protocol variant {0:?}")]
    UnknownVariantName(String),

    #[error("device mapping has a blank device id")]
    BlankDeviceId,

    #[error("unknown device {0}")]
    UnknownDevice(String),
}

/// Failure reported by the feed client or the feed document parser.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed transport error: {0}")]
    Transport(String),

    #[error("feed document error: {0}")]
    Document(#[from] serde_json::Error),
}

/// Failure reported by the record sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("watermark lookup failed for {device_id}: {reason}")]
    Lookup { device_id: String, reason: String },

    #[error("write to {target} failed: {reason}")]
    Write { target: String, reason: String },

    #[error("invalid sink target {0:?}")]
    InvalidTarget(String),

    #[error("watermark commit failed for {device_id}: {reason}")]
    Commit { device_id: String, reason: String },

    #[error("{column} value {value} does not fit the column")]
    OutOfRange { column: &'static str, value: String },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
