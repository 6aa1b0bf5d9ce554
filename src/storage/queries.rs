//! SQL query builders.
//!
//! Generates parameterised SQL for the transaction tables.
//! Actual execution is handled by the sink collaborator.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::SinkError;
use crate::model::ProtocolVariant;

lazy_static! {
    /// Plain SQL identifier, safe to interpolate
    static ref IDENTIFIER_PATTERN: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,127}$").unwrap();
}

/// Columns of the fault/runtime table (`IoT_Data_New`).
pub const FAULT_COLUMNS: &[&str] = &[
    "Entry_ID",
    "Device_ID",
    "RuntimeMin",
    "FaultCodes",
    "FaultDescriptions",
    "LeadingFaultCode",
    "LeadingFaultTimeHr",
    "GensetSignal",
    "ThermostatStatus",
    "HVOutputVoltage_kV",
    "HVSourceNo",
    "HVOutputCurrent_mA",
    "HexField",
    "CreatedAt",
];

/// Columns of the operational table (`IoT_Data_Sick`).
pub const OPERATIONAL_COLUMNS: &[&str] = &[
    "Entry_ID",
    "Device_ID",
    "GSM_Signal_Strength",
    "Motor_ON_Time_sec",
    "Motor_OFF_Time_sec",
    "Number_of_Wheels_Configured",
    "Latitude",
    "Longitude",
    "Number_of_Wheels_Detected",
    "Fault_Code",
    "Motor_Current_mA",
    "CreatedAt",
    "HexField",
    "Timestamp",
];

/// Get the column list written for a variant.
pub fn columns_for(variant: ProtocolVariant) -> &'static [&'static str] {
    match variant {
        ProtocolVariant::P1 => FAULT_COLUMNS,
        ProtocolVariant::P2 => OPERATIONAL_COLUMNS,
    }
}

/// Validate a table name before it is interpolated into SQL.
pub fn checked_table(table: &str) -> Result<&str, SinkError> {
    if IDENTIFIER_PATTERN.is_match(table) {
        Ok(table)
    } else {
        Err(SinkError::InvalidTarget(table.to_string()))
    }
}

/// Build INSERT query for a transaction table.
///
/// Parameters are named after their columns (`:Entry_ID`, ...).
pub fn build_insert(table: &str, variant: ProtocolVariant) -> Result<String, SinkError> {
    let table = checked_table(table)?;
    let columns = columns_for(variant);
    let placeholders: Vec<String> = columns.iter().map(|c| format!(":{}", c)).collect();

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    ))
}

/// Build the watermark seed query for a transaction table.
pub fn build_last_created_at_query(table: &str) -> Result<String, SinkError> {
    let table = checked_table(table)?;
    Ok(format!(
        "SELECT MAX(CreatedAt) AS LastTime FROM {} WHERE Device_ID = :device_id",
        table
    ))
}

/// Build SELECT query for a client's device mappings.
pub fn build_device_mapping_query() -> &'static str {
    r#"
    SELECT Device_ID, Channel_ID, Field_ID, APIKey, ConversionLogicID,
           TransactionTableName, Client_ID
    FROM Device
    WHERE Client_ID = :client_id
    "#
}

/// Build SELECT query for all client ids.
pub fn build_client_ids_query() -> &'static str {
    "SELECT DISTINCT Client_ID FROM Device ORDER BY Client_ID"
}
