//! Pipeline context management.
//!
//! Provides run and device context for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one orchestrator run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        let run_id = format!("run-{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self::with_id(&run_id)
    }

    /// Context with a caller-chosen run id (e.g. a scheduler job id).
    pub fn with_id(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id)
    }

    /// Create a device context for this run.
    pub fn device_context(&self, device_id: &str) -> DeviceContext {
        DeviceContext {
            run_id: self.run_id.clone(),
            device_id: device_id.to_string(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for a single device within a run.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub run_id: String,
    pub device_id: String,
}

impl DeviceContext {
    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.run_id).with_device(&self.device_id)
    }
}
