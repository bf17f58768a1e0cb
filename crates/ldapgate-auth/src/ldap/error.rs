//! Directory error types

use ldap3::LdapError;
use thiserror::Error;

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Failure reported by a directory connector or session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The directory rejected the bind identity or credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Any other protocol or network failure
    #[error("Naming failure: {0}")]
    NamingFailure(String),
}

/// Result codes that mean the credentials themselves were refused
// 48 inappropriateAuthentication, 49 invalidCredentials, 50 insufficientAccessRights
const CREDENTIAL_RESULT_CODES: [u32; 3] = [48, 49, 50];

impl From<LdapError> for DirectoryError {
    fn from(err: LdapError) -> Self {
        match &err {
            LdapError::LdapResult { result } if CREDENTIAL_RESULT_CODES.contains(&result.rc) => {
                DirectoryError::AuthenticationFailed(err.to_string())
            }
            _ => DirectoryError::NamingFailure(err.to_string()),
        }
    }
}

/// Why an authentication attempt was denied
///
/// Every variant collapses to `false` at the public boundary; the variant
/// only feeds the log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("Username or password not supplied")]
    InputRejected,

    #[error("Configuration incomplete, missing: {0}")]
    ConfigurationIncomplete(String),

    #[error("Bind rejected: {0}")]
    BindAuthenticationFailed(String),

    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("No directory entry matched the user filter")]
    UserNotFound,
}

impl From<DirectoryError> for AuthFailure {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::AuthenticationFailed(msg) => AuthFailure::BindAuthenticationFailed(msg),
            DirectoryError::NamingFailure(msg) => AuthFailure::DirectoryUnavailable(msg),
        }
    }
}
