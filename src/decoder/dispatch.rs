//! Protocol dispatch.
//!
//! The variant always comes from the device mapping. Payload shape is only
//! used as an integrity check inside each decoder, so a frame whose shape
//! contradicts its configured variant fails instead of being mis-decoded.

use crate::codec::{is_decimal, is_hex, CHUNK_SIZE};
use crate::error::DecodeResult;
use crate::model::{DecodedRecord, ProtocolVariant, RawFrame, Telemetry};

use super::p1::decode_p1;
use super::p2::{decode_p2, MIN_CHUNKS};

/// Decode a payload with the given variant.
pub fn decode(payload: &str, variant: ProtocolVariant) -> DecodeResult<Telemetry> {
    match variant {
        ProtocolVariant::P1 => decode_p1(payload).map(Telemetry::Fault),
        ProtocolVariant::P2 => decode_p2(payload).map(Telemetry::Operational),
    }
}

/// Decode a frame into a record attributed to `device_id`.
pub fn decode_frame(
    device_id: &str,
    variant: ProtocolVariant,
    frame: &RawFrame,
) -> DecodeResult<DecodedRecord> {
    let telemetry = decode(&frame.payload, variant)?;
    Ok(DecodedRecord::from_frame(device_id, frame, telemetry))
}

/// Guess a variant from payload shape alone.
///
/// Digits only => P1; hex with at least one letter and room for every
/// chunk => P2. Used where no mapping is available (ad-hoc decoding);
/// the ingestion path never relies on it.
pub fn detect_variant(payload: &str) -> Option<ProtocolVariant> {
    if is_decimal(payload) {
        Some(ProtocolVariant::P1)
    } else if is_hex(payload) && payload.len() >= CHUNK_SIZE * MIN_CHUNKS {
        Some(ProtocolVariant::P2)
    } else {
        None
    }
}
