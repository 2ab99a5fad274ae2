//! Bulk user enrollment: read CSV records, validate them, and submit each to
//! a user-creation API with bounded exponential backoff.

pub mod api;
pub mod backoff;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod ui;
