//! Calculator settings.
//!
//! Settings are plain data handed to the engine; loading them from disk is
//! the only I/O in the crate.

mod settings;

pub use settings::{ConfigError, MaxLength, Settings, MAX_PRECISION};
