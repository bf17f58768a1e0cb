//! Configuration for Ldapgate
//!
//! Two views over one TOML file:
//! - [`Properties`]: flat `dotted.key -> string` options consumed by authenticators
//! - [`GateConfig`]: typed settings for the binary itself (logging)
//!
//! Example:
//! ```toml
//! [logging]
//! level = "info"
//!
//! [ldap]
//! domain.name = "corp.example.org"
//! server.name = "ldap1"
//! username.attribute = "sAMAccountName"
//! queryuser.username = "svc-ldapgate"
//! queryuser.password = "changeme"
//! security.group = "Admins"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::{Error, Result, ENV_PREFIX};

// ============================================================================
// Properties
// ============================================================================

/// Immutable option-name to string-value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used when assembling properties in code
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Value for `key`, or an empty string when the key is absent
    pub fn get(&self, key: &str) -> String {
        self.values.get(key).cloned().unwrap_or_default()
    }

    /// Value for `key` when present
    pub fn optional(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Value of the first key in `keys` that is present
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.optional(key))
    }

    /// Parse an unsigned integer, falling back to `default` on absence or bad input
    pub fn u64_or(&self, key: &str, default: u64) -> u64 {
        match self.optional(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Invalid number for [{}]: {:?}, using {}", key, raw, default);
                default
            }),
        }
    }

    /// Parse a boolean, falling back to `default` on absence or bad input
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.optional(key).map(|v| v.trim().to_ascii_lowercase()) {
            None => default,
            Some(v) if v == "true" || v == "yes" || v == "1" => true,
            Some(v) if v == "false" || v == "no" || v == "0" => false,
            Some(v) => {
                warn!("Invalid boolean for [{}]: {:?}, using {}", key, v, default);
                default
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(mut self, other: Properties) -> Self {
        self.values.extend(other.values);
        self
    }

    /// Load properties from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse TOML, flattening nested tables into dotted keys
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let mut values = BTreeMap::new();
        flatten_table("", &table, &mut values)?;

        debug!("Loaded {} configuration properties", values.len());
        Ok(Self { values })
    }

    /// Read `keys` from the process environment (`ldap.domain.name` -> `LDAPGATE_LDAP_DOMAIN_NAME`)
    pub fn from_env(keys: &[&str]) -> Self {
        Self::from_lookup(keys, |name| std::env::var(name).ok())
    }

    /// Read `keys` through an arbitrary variable lookup
    pub fn from_lookup<F>(keys: &[&str], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let values = keys
            .iter()
            .filter_map(|key| lookup(&env_var_name(key)).map(|v| (key.to_string(), v)))
            .collect();

        Self { values }
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Environment variable name for a dotted configuration key
pub fn env_var_name(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.to_ascii_uppercase().replace(['.', '-'], "_"))
}

fn flatten_table(
    prefix: &str,
    table: &toml::Table,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    for (name, value) in table {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };

        match value {
            toml::Value::Table(nested) => flatten_table(&key, nested, out)?,
            toml::Value::String(s) => {
                out.insert(key, s.clone());
            }
            toml::Value::Integer(i) => {
                out.insert(key, i.to_string());
            }
            toml::Value::Float(f) => {
                out.insert(key, f.to_string());
            }
            toml::Value::Boolean(b) => {
                out.insert(key, b.to_string());
            }
            toml::Value::Datetime(dt) => {
                out.insert(key, dt.to_string());
            }
            toml::Value::Array(_) => {
                return Err(Error::UnsupportedValue {
                    key,
                    reason: "arrays are not supported".to_string(),
                });
            }
        }
    }

    Ok(())
}

// ============================================================================
// Binary settings
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GateConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
