//! Hex/bit codec module.
//!
//! Stateless primitives shared by both frame layouts:
//! - Fixed-size chunk splitting
//! - Hex parsing with alphabet validation
//! - XOR de-obfuscation of 8-digit chunks
//! - Zero-padded binary rendering
//! - Named bit ranges over a 64-bit frame image

pub mod bits;
pub mod hex;

pub use bits::*;
pub use hex::*;
