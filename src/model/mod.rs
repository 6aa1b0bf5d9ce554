//! Data model.
//!
//! - `device` - Device mappings and protocol variants
//! - `frame` - Raw frames and timestamp normalisation
//! - `record` - Decoded, protocol-tagged records

pub mod device;
pub mod frame;
pub mod record;

pub use device::*;
pub use frame::*;
pub use record::*;
