//! Fault code table for P1 frames.

/// Number of fault codes carried by the fault bitmap.
pub const FAULT_CODE_COUNT: usize = 16;

/// Description for each fault code, indexed by code.
pub const FAULT_DESCRIPTIONS: [&str; FAULT_CODE_COUNT] = [
    "FAULT_HT_VTG_TOO_LOW",
    "FAULT_HT_ARC_CNT_SHORT",
    "FAULT_HT_I_TOO_LOW",
    "FAULT_THERMOSTAT_BROKEN",
    "FAULT_GENSET_SIG_LOST",
    "FAULT_MOTOR_CURRENT_TOO_LOW",
    "FAULT_MOTOR_CURRENT_TOO_HIGH",
    "FAULT_SCRAPPING_PENDING",
    "FAULT_SOOT_COLLECTION_PENDING",
    "FAULT_MOTOR_OUT_OF_PARK",
    "FAULT_GSM_SIG_LOST",
    "FAULT_INDUCEMENT_REQUESTED",
    "FAULT_ES_SIGNAL",
    "FAULT_SHAKER_MOTOR_CURRENT_TOO_LOW",
    "FAULT_SHAKER_MOTOR_CURRENT_TOO_HIGH",
    "FAULT_INVALID_FAULT_REPORTED",
];

/// Look up a fault code description.
pub fn fault_description(code: u8) -> Option<&'static str> {
    FAULT_DESCRIPTIONS.get(code as usize).copied()
}
