//! Configuration loading and management.
//!
//! - [`types`]: the top-level [`Config`], server identity and logging
//! - [`links`]: the uplink connection block
//! - [`validation`]: startup checks run after parsing

mod links;
mod types;
mod validation;

pub use links::UplinkConfig;
pub use types::{Config, ConfigError, LogConfig, LogFormat, PseudoClientBlock, ServerConfig};
pub use validation::{ValidationError, validate};
