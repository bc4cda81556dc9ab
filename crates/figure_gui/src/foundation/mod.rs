//! Foundation module - shared utilities
//!
//! - Logging setup for binaries and tests

pub mod logging;
