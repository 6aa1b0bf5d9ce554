//! P1 fault/runtime frame decoding.
//!
//! The payload is a decimal number whose value is the frame image. Rendered
//! as 16 hex digits (most significant first) the layout is:
//!
//! ```text
//! digit  0-1   HV current byte   (source no: top 2 bits, current mA: low 6)
//! digit  2-3   signal byte       (genset: bit 7, thermostat: bit 6, kV: low 6)
//! digit  4-5   leading fault age (hours)
//! digit  6     leading fault code
//! digit  7     unused
//! digit  8-11  fault bitmap      (bit n set => fault code n active)
//! digit 12-15  runtime (minutes)
//! ```

use crate::codec::{is_decimal, parse_decimal_u64, BitRange};
use crate::error::{DecodeResult, ShapeError};
use crate::model::{FaultTelemetry, SignalState};

use super::fault_codes::{fault_description, FAULT_CODE_COUNT};

/// Field layout as bit ranges over the 64-bit image, least significant first.
pub mod layout {
    use crate::codec::BitRange;

    pub const RUNTIME_MINUTES: BitRange = BitRange::hex_digits(0, 4);
    pub const FAULT_BITMAP: BitRange = BitRange::hex_digits(4, 4);
    pub const LEADING_FAULT_CODE: BitRange = BitRange::hex_digits(9, 1);
    pub const LEADING_FAULT_AGE_HOURS: BitRange = BitRange::hex_digits(10, 2);

    pub const SIGNAL_BYTE: BitRange = BitRange::hex_digits(12, 2);
    pub const GENSET_SIGNAL: BitRange = SIGNAL_BYTE.sub(7, 1);
    pub const THERMOSTAT_STATUS: BitRange = SIGNAL_BYTE.sub(6, 1);
    pub const HV_OUTPUT_VOLTAGE_KV: BitRange = SIGNAL_BYTE.sub(0, 6);

    pub const HV_CURRENT_BYTE: BitRange = BitRange::hex_digits(14, 2);
    pub const HV_SOURCE_NO: BitRange = HV_CURRENT_BYTE.sub(6, 2);
    pub const HV_OUTPUT_CURRENT_MA: BitRange = HV_CURRENT_BYTE.sub(0, 6);
}

/// Decode a P1 payload.
///
/// Payloads that are not purely decimal digits are rejected as a shape
/// mismatch before any numeric parsing.
pub fn decode_p1(payload: &str) -> DecodeResult<FaultTelemetry> {
    if payload.is_empty() {
        return Err(ShapeError::EmptyPayload.into());
    }
    if !is_decimal(payload) {
        return Err(ShapeError::VariantMismatch { variant: "P1" }.into());
    }

    let image = parse_decimal_u64(payload)?;
    Ok(decode_image(image))
}

/// Decode the fields of a P1 frame image.
pub fn decode_image(image: u64) -> FaultTelemetry {
    let active_fault_codes = active_fault_codes(layout::FAULT_BITMAP, image);
    let fault_descriptions = active_fault_codes
        .iter()
        .filter_map(|code| fault_description(*code))
        .collect();

    FaultTelemetry {
        runtime_minutes: layout::RUNTIME_MINUTES.extract(image) as u16,
        active_fault_codes,
        fault_descriptions,
        leading_fault_code: layout::LEADING_FAULT_CODE.extract(image) as u8,
        leading_fault_age_hours: layout::LEADING_FAULT_AGE_HOURS.extract(image) as u8,
        genset_signal: SignalState::from_bit(layout::GENSET_SIGNAL.is_set(image)),
        thermostat_status: SignalState::from_bit(layout::THERMOSTAT_STATUS.is_set(image)),
        hv_output_voltage_kv: layout::HV_OUTPUT_VOLTAGE_KV.extract(image) as u8,
        hv_source_no: layout::HV_SOURCE_NO.extract(image) as u8,
        hv_output_current_ma: layout::HV_OUTPUT_CURRENT_MA.extract(image) as u8,
    }
}

/// Active codes in ascending order.
fn active_fault_codes(bitmap: BitRange, image: u64) -> Vec<u8> {
    let bits = bitmap.extract(image);
    (0..FAULT_CODE_COUNT as u8)
        .filter(|code| (bits >> code) & 1 == 1)
        .collect()
}
