//! Ldapgate Core Library
//!
//! Configuration and error types shared by the ldapgate crates.

pub mod config;
pub mod error;

pub use config::{GateConfig, LoggingConfig, Properties};
pub use error::{Error, Result};

/// Ldapgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix for environment variables that override configuration keys
pub const ENV_PREFIX: &str = "LDAPGATE_";
