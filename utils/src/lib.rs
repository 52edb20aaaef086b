//! Shared utilities for the cohort governance engine.

pub mod logging;

pub use logging::{init_logging, init_test_logging, LogFormat, LoggingError};
