//! Row models for decoded record storage.
//!
//! These map records onto the legacy transaction table columns.

use std::fmt;

use serde::Serialize;

use crate::error::SinkError;
use crate::model::{DecodedRecord, Telemetry};

/// Timestamp layout used by the transaction tables.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnValue::Int(v) => write!(f, "{}", v),
            ColumnValue::Float(v) => write!(f, "{}", v),
            ColumnValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<u8> for ColumnValue {
    fn from(v: u8) -> Self {
        ColumnValue::Int(i64::from(v))
    }
}

impl From<u16> for ColumnValue {
    fn from(v: u16) -> Self {
        ColumnValue::Int(i64::from(v))
    }
}

impl From<f64> for ColumnValue {
    fn from(v: f64) -> Self {
        ColumnValue::Float(v)
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Text(v)
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Text(v.to_string())
    }
}

/// Ordered `(column, value)` pairs for a record.
pub type Row = Vec<(&'static str, ColumnValue)>;

/// Flatten a record into its table columns.
///
/// Fails when the entry id does not fit the signed `Entry_ID` column.
pub fn record_columns(record: &DecodedRecord) -> Result<Row, SinkError> {
    let created_at = record.created_at.format(CREATED_AT_FORMAT).to_string();
    let entry_id = i64::try_from(record.entry_id)
        .map(ColumnValue::Int)
        .map_err(|_| SinkError::OutOfRange {
            column: "Entry_ID",
            value: record.entry_id.to_string(),
        })?;

    let mut row: Row = vec![
        ("Entry_ID", entry_id),
        ("Device_ID", record.device_id.as_str().into()),
    ];

    match &record.telemetry {
        Telemetry::Fault(t) => {
            let codes = t
                .active_fault_codes
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            let fields: Row = vec![
                ("RuntimeMin", t.runtime_minutes.into()),
                ("FaultCodes", codes.into()),
                ("FaultDescriptions", t.fault_descriptions.join(", ").into()),
                ("LeadingFaultCode", t.leading_fault_code.into()),
                ("LeadingFaultTimeHr", t.leading_fault_age_hours.into()),
                ("GensetSignal", t.genset_signal.as_str().into()),
                ("ThermostatStatus", t.thermostat_status.as_str().into()),
                ("HVOutputVoltage_kV", t.hv_output_voltage_kv.into()),
                ("HVSourceNo", t.hv_source_no.into()),
                ("HVOutputCurrent_mA", t.hv_output_current_ma.into()),
                ("HexField", record.payload.as_str().into()),
                ("CreatedAt", created_at.into()),
            ];
            row.extend(fields);
        }
        Telemetry::Operational(t) => {
            let fields: Row = vec![
                ("GSM_Signal_Strength", t.gsm_signal_strength.into()),
                ("Motor_ON_Time_sec", t.motor_on_time_sec.into()),
                ("Motor_OFF_Time_sec", t.motor_off_time_sec.into()),
                ("Number_of_Wheels_Configured", t.wheels_configured.into()),
                ("Latitude", t.latitude.value().into()),
                ("Longitude", t.longitude.value().into()),
                ("Number_of_Wheels_Detected", t.wheels_detected.into()),
                ("Fault_Code", t.fault_code.into()),
                ("Motor_Current_mA", t.motor_current_ma.into()),
                ("CreatedAt", created_at.clone().into()),
                ("HexField", record.payload.as_str().into()),
                ("Timestamp", created_at.into()),
            ];
            row.extend(fields);
        }
    }

    Ok(row)
}
