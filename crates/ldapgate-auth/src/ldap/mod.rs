//! LDAP/Active Directory authentication module
//!
//! Provides:
//! - Query-identity bind followed by a user rebind on the same session
//! - Filter composition for Active Directory user and group lookups
//! - Pluggable connectors (`ldap3` in production, fakes in tests)

mod authenticator;
mod connector;
mod error;
mod filter;
mod types;

pub use authenticator::DirectoryAuthenticator;
pub use connector::{DirectoryConnector, DirectorySession, Ldap3Connector, Ldap3Session};
pub use error::{AuthFailure, DirectoryError, DirectoryResult};
pub use filter::{
    domain_to_search_base, group_clause, service_url, user_filter, UserQuery,
    SECURITY_GROUPS_OU, USER_OBJECT_CLASS,
};
pub use types::*;
