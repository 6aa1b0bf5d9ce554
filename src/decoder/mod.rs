//! Frame decoder module.
//!
//! Pure decoding of hex payloads into typed telemetry:
//! - `p1` - Fault/runtime frames (decimal-encoded 64-bit image)
//! - `p2` - XOR-obfuscated operational/location frames
//! - `dispatch` - Variant selection keyed by the device mapping
//! - `fault_codes` - Fault code descriptions

pub mod dispatch;
pub mod fault_codes;
pub mod p1;
pub mod p2;

pub use dispatch::*;
pub use fault_codes::*;
pub use p1::decode_p1;
pub use p2::decode_p2;
