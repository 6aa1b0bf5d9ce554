//! Feed module.
//!
//! The remote feed client (HTTP fetch, retry, backoff) lives outside the
//! core. This module defines the interface the orchestrator consumes and
//! parses the feed service's JSON document into raw frames.

pub mod client;
pub mod document;

pub use client::*;
pub use document::*;
