//! P2 operational frame decoding.
//!
//! The payload is a sequence of 8-digit hex chunks, each XORed with a shared
//! static key. After de-obfuscation:
//!
//! ```text
//! C0  series (4 digits) | serial (4 digits)
//! C1  gsm | motor on (s) | motor off (s) | wheels configured
//! C2  latitude integer (4 digits) | longitude integer (4 digits)
//! C3  latitude fraction
//! C4  longitude fraction
//! C5  wheels detected | fault code | motor current, little-endian (2 bytes)
//! ```
//!
//! Chunks past C5 carry no exposed field but are still de-obfuscated.

use crate::codec::{
    is_decimal, is_hex, parse_hex_u16, parse_hex_u32, parse_hex_u8, split_chunks, xor_hex,
    CHUNK_SIZE,
};
use crate::error::{DecodeResult, FormatError, ShapeError};
use crate::model::{Coordinate, DeviceIdentity, OperationalTelemetry};

/// Shared static obfuscation key.
pub const XOR_KEY: &str = "7AC5B2E1";

/// Minimum number of chunks in a well-formed frame.
pub const MIN_CHUNKS: usize = 6;

/// Decode a P2 payload.
pub fn decode_p2(payload: &str) -> DecodeResult<OperationalTelemetry> {
    let chunks = decrypt_chunks(payload)?;

    let reported_identity = device_identity(&chunks[0])?;
    let [gsm_signal_strength, motor_on_time_sec, motor_off_time_sec, wheels_configured] =
        chunk_bytes(&chunks[1])?;

    let latitude_integer = parse_hex_u16(&chunks[2][..4])?;
    let longitude_integer = parse_hex_u16(&chunks[2][4..])?;
    let latitude_fraction = parse_hex_u32(&chunks[3])?;
    let longitude_fraction = parse_hex_u32(&chunks[4])?;

    let [wheels_detected, fault_code, current_lo, current_hi] = chunk_bytes(&chunks[5])?;

    Ok(OperationalTelemetry {
        reported_identity,
        gsm_signal_strength,
        motor_on_time_sec,
        motor_off_time_sec,
        wheels_configured,
        latitude: Coordinate::new(latitude_integer, latitude_fraction),
        longitude: Coordinate::new(longitude_integer, longitude_fraction),
        wheels_detected,
        fault_code,
        motor_current_ma: u16::from_le_bytes([current_lo, current_hi]),
    })
}

/// Validate the payload shape and de-obfuscate every chunk.
///
/// Returned chunks are 8 upper-case hex digits each.
pub fn decrypt_chunks(payload: &str) -> DecodeResult<Vec<String>> {
    if payload.is_empty() {
        return Err(ShapeError::EmptyPayload.into());
    }
    // A digits-only payload is a P1 frame routed to the wrong decoder.
    if is_decimal(payload) {
        return Err(ShapeError::VariantMismatch { variant: "P2" }.into());
    }
    if !is_hex(payload) {
        return Err(FormatError::InvalidHex(payload.to_string()).into());
    }
    if payload.len() % CHUNK_SIZE != 0 {
        return Err(ShapeError::RaggedChunk {
            len: payload.len(),
            chunk_size: CHUNK_SIZE,
        }
        .into());
    }

    let chunks = split_chunks(payload, CHUNK_SIZE);
    if chunks.len() < MIN_CHUNKS {
        return Err(ShapeError::TooFewChunks {
            expected: MIN_CHUNKS,
            actual: chunks.len(),
        }
        .into());
    }

    let decrypted = chunks
        .iter()
        .map(|chunk| xor_hex(chunk, XOR_KEY))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(decrypted)
}

fn device_identity(chunk: &str) -> Result<DeviceIdentity, FormatError> {
    Ok(DeviceIdentity {
        series_id: parse_hex_u16(&chunk[..4])?,
        serial_no: parse_hex_u16(&chunk[4..])?,
    })
}

/// Split a decrypted chunk into its four bytes, in textual order.
fn chunk_bytes(chunk: &str) -> Result<[u8; 4], FormatError> {
    let mut bytes = [0u8; 4];
    for (slot, part) in bytes.iter_mut().zip(split_chunks(chunk, 2)) {
        *slot = parse_hex_u8(part)?;
    }
    Ok(bytes)
}
