//! Decoded telemetry records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::device::ProtocolVariant;
use super::frame::RawFrame;

/// Two-state signal surfaced as `On`/`Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalState {
    On,
    Off,
}

impl SignalState {
    pub fn from_bit(set: bool) -> Self {
        if set {
            SignalState::On
        } else {
            SignalState::Off
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalState::On => "On",
            SignalState::Off => "Off",
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fault/runtime telemetry (P1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultTelemetry {
    pub runtime_minutes: u16,
    /// Ascending, each in 0..=15.
    pub active_fault_codes: Vec<u8>,
    /// One entry per active code, same order.
    pub fault_descriptions: Vec<&'static str>,
    pub leading_fault_code: u8,
    pub leading_fault_age_hours: u8,
    pub genset_signal: SignalState,
    pub thermostat_status: SignalState,
    pub hv_output_voltage_kv: u8,
    pub hv_source_no: u8,
    pub hv_output_current_ma: u8,
}

/// Series and serial number carried in the first P2 chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub series_id: u16,
    pub serial_no: u16,
}

impl fmt::Display for DeviceIdentity {
    // Legacy rendering: decimal series immediately followed by decimal serial.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.series_id, self.serial_no)
    }
}

/// Coordinate built by textual concatenation `"{integer}.{fraction}"`.
///
/// The fractional part is not scaled to a fixed number of places: a fraction
/// of `5` reads as `.5` and a fraction of `50` as `.50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coordinate {
    pub integer_part: u16,
    pub fractional_part: u32,
}

impl Coordinate {
    pub fn new(integer_part: u16, fractional_part: u32) -> Self {
        Self {
            integer_part,
            fractional_part,
        }
    }

    /// Decimal value of the concatenated text.
    pub fn value(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.integer_part, self.fractional_part)
    }
}

/// Operational/location telemetry (P2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationalTelemetry {
    /// Decoded for audit only; the mapping's device id stays authoritative.
    pub reported_identity: DeviceIdentity,
    pub gsm_signal_strength: u8,
    pub motor_on_time_sec: u8,
    pub motor_off_time_sec: u8,
    pub wheels_configured: u8,
    pub latitude: Coordinate,
    pub longitude: Coordinate,
    pub wheels_detected: u8,
    pub fault_code: u8,
    pub motor_current_ma: u16,
}

/// Protocol-tagged decoded payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "variant")]
pub enum Telemetry {
    #[serde(rename = "P1")]
    Fault(FaultTelemetry),
    #[serde(rename = "P2")]
    Operational(OperationalTelemetry),
}

impl Telemetry {
    pub fn variant(&self) -> ProtocolVariant {
        match self {
            Telemetry::Fault(_) => ProtocolVariant::P1,
            Telemetry::Operational(_) => ProtocolVariant::P2,
        }
    }
}

/// A decoded frame ready for the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedRecord {
    pub device_id: String,
    pub entry_id: u64,
    pub created_at: DateTime<Utc>,
    /// Original payload, kept for audit.
    pub payload: String,
    pub telemetry: Telemetry,
}

impl DecodedRecord {
    pub fn from_frame(device_id: &str, frame: &RawFrame, telemetry: Telemetry) -> Self {
        Self {
            device_id: device_id.to_string(),
            entry_id: frame.entry_id,
            created_at: frame.observed_at,
            payload: frame.payload.clone(),
            telemetry,
        }
    }

    pub fn variant(&self) -> ProtocolVariant {
        self.telemetry.variant()
    }
}
