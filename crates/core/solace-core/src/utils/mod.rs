//! Utility functions and helpers

pub mod logger;

pub use logger::{init_logging, init_logging_with, DEFAULT_LOG_LEVEL};
