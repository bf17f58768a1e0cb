//! Error types for Ldapgate

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Configuration Errors
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unsupported value for {key}: {reason}")]
    UnsupportedValue { key: String, reason: String },
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::ConfigRead { .. } => "ConfigRead",
            Error::ConfigParse(_) => "ConfigParse",
            Error::UnsupportedValue { .. } => "UnsupportedValue",
        }
    }
}
