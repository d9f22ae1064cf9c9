//! Configuration management
//!
//! Mining difficulty, worker count, log level and demo relay settings.
//! Values come from defaults, an optional TOML file and `SIMPLECOIN_*`
//! environment variables, in that order.

pub mod settings;

pub use settings::{Config, Settings, GLOBAL_CONFIG};
