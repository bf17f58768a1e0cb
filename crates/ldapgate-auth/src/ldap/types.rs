//! LDAP/Active Directory settings and session types
//!
//! Settings are derived from flat [`Properties`] on every authentication
//! attempt. Absent keys degrade to empty strings.

use ldapgate_core::Properties;
use std::time::Duration;

use crate::ldap::error::AuthFailure;
use tracing::warn;

// ============================================================================
// Configuration keys
// ============================================================================

pub mod keys {
    /// Directory domain, dot-separated (e.g. `corp.example.org`)
    pub const DOMAIN_NAME: &str = "ldap.domain.name";
    /// Host label (or `host:port`) prefixed to the domain
    pub const SERVER_NAME: &str = "ldap.server.name";
    /// Attribute holding the login name (e.g. `sAMAccountName`)
    pub const USERNAME_ATTRIBUTE: &str = "ldap.username.attribute";
    pub const QUERY_USERNAME: &str = "ldap.queryuser.username";
    pub const QUERY_PASSWORD: &str = "ldap.queryuser.password";
    pub const SECURITY_GROUP: &str = "ldap.security.group";
    /// Alias of [`SECURITY_GROUP`]
    pub const REQUIRED_GROUP: &str = "ldap.required.group";
    pub const TIMEOUT_SECONDS: &str = "ldap.timeout.seconds";
    pub const TLS_SKIP_VERIFY: &str = "ldap.tls.skip.verify";

    /// Keys that must be present for a meaningful query
    pub const REQUIRED: &[&str] = &[
        DOMAIN_NAME,
        SERVER_NAME,
        USERNAME_ATTRIBUTE,
        QUERY_USERNAME,
        QUERY_PASSWORD,
    ];

    /// Group keys in precedence order
    pub const GROUP: &[&str] = &[SECURITY_GROUP, REQUIRED_GROUP];

    /// Every key read from the environment
    pub const ALL: &[&str] = &[
        DOMAIN_NAME,
        SERVER_NAME,
        USERNAME_ATTRIBUTE,
        QUERY_USERNAME,
        QUERY_PASSWORD,
        SECURITY_GROUP,
        REQUIRED_GROUP,
        TIMEOUT_SECONDS,
        TLS_SKIP_VERIFY,
    ];
}

// ============================================================================
// Directory settings
// ============================================================================

/// Directory settings for one authentication attempt
#[derive(Clone, PartialEq, Eq)]
pub struct LdapSettings {
    pub domain_name: String,
    pub server_name: String,
    pub username_attribute: String,
    pub query_username: String,
    pub query_password: String,
    /// `None` disables the group restriction; an empty value counts as `None`
    pub required_group: Option<String>,
}

impl LdapSettings {
    /// Read settings, logging absent keys as incomplete configuration
    pub fn from_properties(props: &Properties) -> Self {
        let missing: Vec<&str> = keys::REQUIRED
            .iter()
            .copied()
            .filter(|key| !props.contains_key(key))
            .collect();

        if !missing.is_empty() {
            warn!("{}", AuthFailure::ConfigurationIncomplete(missing.join(", ")));
        }

        let required_group = props
            .first_of(keys::GROUP)
            .filter(|group| !group.is_empty())
            .map(str::to_string);

        Self {
            domain_name: props.get(keys::DOMAIN_NAME),
            server_name: props.get(keys::SERVER_NAME),
            username_attribute: props.get(keys::USERNAME_ATTRIBUTE),
            query_username: props.get(keys::QUERY_USERNAME),
            query_password: props.get(keys::QUERY_PASSWORD),
            required_group,
        }
    }

    /// Bind options for the query identity
    pub fn query_bind(&self) -> BindOptions {
        BindOptions::simple(&self.query_username, &self.query_password)
    }
}

impl std::fmt::Debug for LdapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSettings")
            .field("domain_name", &self.domain_name)
            .field("server_name", &self.server_name)
            .field("username_attribute", &self.username_attribute)
            .field("query_username", &self.query_username)
            .field("query_password", &"<redacted>")
            .field("required_group", &self.required_group)
            .finish()
    }
}

/// Transport settings for the ldap3-backed connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorSettings {
    /// Connection timeout
    pub timeout: Duration,
    /// Skip TLS certificate verification (not recommended for production)
    pub skip_tls_verify: bool,
}

fn default_timeout() -> u64 {
    10
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(default_timeout()),
            skip_tls_verify: false,
        }
    }
}

impl ConnectorSettings {
    pub fn from_properties(props: &Properties) -> Self {
        Self {
            timeout: Duration::from_secs(props.u64_or(keys::TIMEOUT_SECONDS, default_timeout())),
            skip_tls_verify: props.bool_or(keys::TLS_SKIP_VERIFY, false),
        }
    }
}

// ============================================================================
// Bind options
// ============================================================================

/// Authentication mechanism used for a bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindMechanism {
    /// LDAP simple bind (principal + password)
    #[default]
    Simple,
}

impl BindMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindMechanism::Simple => "simple",
        }
    }
}

/// Identity used to bind a directory session
#[derive(Clone, PartialEq, Eq)]
pub struct BindOptions {
    pub mechanism: BindMechanism,
    pub principal: String,
    pub credentials: String,
}

impl BindOptions {
    pub fn simple(principal: impl Into<String>, credentials: impl Into<String>) -> Self {
        Self {
            mechanism: BindMechanism::Simple,
            principal: principal.into(),
            credentials: credentials.into(),
        }
    }
}

impl std::fmt::Debug for BindOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindOptions")
            .field("mechanism", &self.mechanism)
            .field("principal", &self.principal)
            .field("credentials", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Search
// ============================================================================

/// Search scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// The base object and everything below it
    Subtree,
}

impl From<SearchScope> for ldap3::Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// One entry returned by a directory search; only the DN is fetched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Entry DN (Distinguished Name)
    pub dn: String,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self { dn: dn.into() }
    }
}

impl From<ldap3::SearchEntry> for DirectoryEntry {
    fn from(entry: ldap3::SearchEntry) -> Self {
        Self::new(entry.dn)
    }
}
