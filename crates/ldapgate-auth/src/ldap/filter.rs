//! Pure query composition: service URL, search base and user filter
//!
//! Nothing here performs I/O. Configuration values are embedded verbatim;
//! the username is escaped per RFC 4515 before it enters the filter.

use ldap3::ldap_escape;

use crate::ldap::types::LdapSettings;

/// Object class every matched account must carry
pub const USER_OBJECT_CLASS: &str = "user";

/// OU that holds the security groups under the domain root
pub const SECURITY_GROUPS_OU: &str = "OU=Security Groups";

/// `ldaps://<server>.<domain>/`
pub fn service_url(server_name: &str, domain_name: &str) -> String {
    format!("ldaps://{}.{}/", server_name, domain_name)
}

/// Convert a dotted domain into a `DC=` search base
///
/// `corp.example.org` becomes `DC=corp,DC=example,DC=org`. Empty segments
/// are skipped, so `""` yields `""` and `a..b` yields `DC=a,DC=b`.
pub fn domain_to_search_base(domain_name: &str) -> String {
    domain_name
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("DC={}", segment))
        .collect::<Vec<_>>()
        .join(",")
}

/// Group-membership clause, or `""` when no group is required
///
/// `ldap3` parses filters before sending them, so the clause must be
/// balanced on its own.
pub fn group_clause(required_group: Option<&str>, search_base: &str) -> String {
    match required_group {
        Some(group) if !group.is_empty() => format!(
            "(memberOf=CN={},{},{})",
            group, SECURITY_GROUPS_OU, search_base
        ),
        _ => String::new(),
    }
}

/// Full user search filter
pub fn user_filter(
    username_attribute: &str,
    username: &str,
    domain_name: &str,
    group_clause: &str,
) -> String {
    let username = ldap_escape(username);
    format!(
        "(&({}={})(objectClass={})(userPrincipalName={}@{}){})",
        username_attribute, username, USER_OBJECT_CLASS, username, domain_name, group_clause
    )
}

/// Everything needed to run the user search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub service_url: String,
    pub search_base: String,
    pub filter: String,
}

impl UserQuery {
    pub fn build(settings: &LdapSettings, username: &str) -> Self {
        let search_base = domain_to_search_base(&settings.domain_name);
        let clause = group_clause(settings.required_group.as_deref(), &search_base);
        let filter = user_filter(
            &settings.username_attribute,
            username,
            &settings.domain_name,
            &clause,
        );

        Self {
            service_url: service_url(&settings.server_name, &settings.domain_name),
            search_base,
            filter,
        }
    }
}
