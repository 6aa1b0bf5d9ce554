//! Device mappings.
//!
//! A mapping tells the orchestrator where a device's readings come from
//! (channel/field), how to decode them and where decoded records go.
//! Mappings are loaded once per run by an external collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MappingError;

/// Wire layout of a device's payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// Fault/runtime report, decimal-encoded 64-bit image.
    P1,
    /// XOR-obfuscated multi-chunk operational/location report.
    P2,
}

impl ProtocolVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVariant::P1 => "P1",
            ProtocolVariant::P2 => "P2",
        }
    }

    /// Map the device table's `ConversionLogicID` onto a variant.
    pub fn from_logic_id(logic_id: i64) -> Result<Self, MappingError> {
        match logic_id {
            1 => Ok(ProtocolVariant::P1),
            2 => Ok(ProtocolVariant::P2),
            other => Err(MappingError::UnknownVariant(other)),
        }
    }

    /// Accepts `"P1"`, `"p2"`, `"1"`, `"2"`.
    pub fn parse(value: &str) -> Result<Self, MappingError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "P1" | "1" => Ok(ProtocolVariant::P1),
            "P2" | "2" => Ok(ProtocolVariant::P2),
            _ => Err(MappingError::UnknownVariantName(value.to_string())),
        }
    }

    /// Legacy transaction table for this variant.
    pub fn default_table(&self) -> &'static str {
        match self {
            ProtocolVariant::P1 => "IoT_Data_New",
            ProtocolVariant::P2 => "IoT_Data_Sick",
        }
    }
}

impl fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feed API key. Never rendered in logs.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Immutable per-run description of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMapping {
    pub device_id: String,
    pub client_id: i64,
    pub channel_id: u64,
    pub field_id: u32,
    pub api_key: ApiKey,
    pub protocol_variant: ProtocolVariant,
    /// Opaque sink target (the transaction table name for SQL sinks).
    pub target_sink: String,
}

impl DeviceMapping {
    /// Key of the payload field inside a feed entry (`field<N>`).
    pub fn field_key(&self) -> String {
        format!("field{}", self.field_id)
    }
}

/// Device table row as returned by the mapping source.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceMappingRow {
    #[serde(rename = "Device_ID")]
    pub device_id: String,
    #[serde(rename = "Client_ID")]
    pub client_id: i64,
    #[serde(rename = "Channel_ID")]
    pub channel_id: u64,
    #[serde(rename = "Field_ID")]
    pub field_id: u32,
    #[serde(rename = "APIKey", default)]
    pub api_key: ApiKey,
    #[serde(rename = "ConversionLogicID")]
    pub conversion_logic_id: i64,
    #[serde(rename = "TransactionTableName", default)]
    pub transaction_table_name: Option<String>,
}

impl TryFrom<DeviceMappingRow> for DeviceMapping {
    type Error = MappingError;

    fn try_from(row: DeviceMappingRow) -> Result<Self, Self::Error> {
        let device_id = row.device_id.trim().to_string();
        if device_id.is_empty() {
            return Err(MappingError::BlankDeviceId);
        }

        let protocol_variant = ProtocolVariant::from_logic_id(row.conversion_logic_id)?;

        let target_sink = row
            .transaction_table_name
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| protocol_variant.default_table().to_string());

        Ok(Self {
            device_id,
            client_id: row.client_id,
            channel_id: row.channel_id,
            field_id: row.field_id,
            api_key: row.api_key,
            protocol_variant,
            target_sink,
        })
    }
}
