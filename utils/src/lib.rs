//! Shared utilities for the verifier registry.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};
