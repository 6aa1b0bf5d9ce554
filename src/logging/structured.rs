//! Structured logging utilities.
//!
//! Provides context-aware logging with run_id, device_id and entry_id
//! included in every log message.

use std::fmt;

/// Logging context for a run, narrowed to a device and a frame.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub device_id: Option<String>,
    pub entry_id: Option<u64>,
}

impl LogContext {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            device_id: None,
            entry_id: None,
        }
    }

    pub fn with_device(&self, device_id: &str) -> Self {
        Self {
            run_id: self.run_id.clone(),
            device_id: Some(device_id.to_string()),
            entry_id: None,
        }
    }

    pub fn with_entry(&self, entry_id: u64) -> Self {
        Self {
            run_id: self.run_id.clone(),
            device_id: self.device_id.clone(),
            entry_id: Some(entry_id),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[run={}]", self.run_id)?;
        if let Some(device_id) = &self.device_id {
            write!(f, " [device={}]", device_id)?;
        }
        if let Some(entry_id) = self.entry_id {
            write!(f, " [entry={}]", entry_id)?;
        }
        Ok(())
    }
}

/// Log an info event with context and `key=value` pairs.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(,)?) => {
        log::info!("{} {}", $ctx, $event)
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::info!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),+),
            $ctx,
            $event,
            $($value),+
        )
    };
}

/// Log a warning event with context and `key=value` pairs.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(,)?) => {
        log::warn!("{} {}", $ctx, $event)
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::warn!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),+),
            $ctx,
            $event,
            $($value),+
        )
    };
}

/// Log an error event with context and `key=value` pairs.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(,)?) => {
        log::error!("{} {}", $ctx, $event)
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::error!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),+),
            $ctx,
            $event,
            $($value),+
        )
    };
}

/// Log a debug event with context and `key=value` pairs.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(,)?) => {
        log::debug!("{} {}", $ctx, $event)
    };
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),+ $(,)?) => {
        log::debug!(
            concat!("{} {}", $(" ", stringify!($key), "={}"),+),
            $ctx,
            $event,
            $($value),+
        )
    };
}
