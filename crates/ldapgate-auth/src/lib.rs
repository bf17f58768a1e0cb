//! Authentication for Ldapgate

pub mod ldap;

pub use ldap::{
    AuthFailure, BindOptions, ConnectorSettings, DirectoryAuthenticator, DirectoryConnector,
    DirectoryError, DirectorySession, Ldap3Connector, LdapSettings,
};

use async_trait::async_trait;

/// A strategy that decides whether a username/password pair is trusted
///
/// Implementations never report why a check failed; the answer is a plain
/// yes or no.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn is_authenticated(&self, username: &str, password: &str) -> bool;
}
