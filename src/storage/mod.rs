//! Storage module.
//!
//! Sink interface, column mapping and SQL query builders.
//! Actual database operations are handled by the sink collaborator.
//! This module provides the shapes it needs.

pub mod memory;
pub mod models;
pub mod queries;
pub mod sink;

pub use memory::*;
pub use models::*;
pub use queries::*;
pub use sink::*;
