//! Directory-backed username/password verification
//!
//! One call runs the whole sequence against a fresh session:
//! 1. reject missing username or password without touching the network
//! 2. open a session bound as the query identity
//! 3. rebind the same session as the user (the password check)
//! 4. search for the user, restricted to the required group if configured
//! 5. close the session, whatever happened above
//!
//! Any matching entry authenticates the user. Entry attributes are not
//! inspected; group membership is enforced by the filter alone.

use async_trait::async_trait;
use ldapgate_core::Properties;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::ldap::connector::{close_session, DirectoryConnector, DirectorySession, Ldap3Connector};
use crate::ldap::error::AuthFailure;
use crate::ldap::filter::UserQuery;
use crate::ldap::types::{ConnectorSettings, LdapSettings, SearchScope};
use crate::Authenticator;

/// Authenticator that checks credentials against an LDAP/Active Directory server
pub struct DirectoryAuthenticator {
    properties: Properties,
    connector: Arc<dyn DirectoryConnector>,
}

impl DirectoryAuthenticator {
    /// Create an authenticator with an explicit connector
    pub fn new(properties: Properties, connector: Arc<dyn DirectoryConnector>) -> Self {
        Self {
            properties,
            connector,
        }
    }

    /// Create an authenticator over `ldap3`, with transport settings read from `properties`
    pub fn with_ldap3(properties: Properties) -> Self {
        let connector = Ldap3Connector::new(ConnectorSettings::from_properties(&properties));
        Self::new(properties, Arc::new(connector))
    }

    /// Query that would be issued for `username` under the current configuration
    pub fn user_query(&self, username: &str) -> UserQuery {
        UserQuery::build(&LdapSettings::from_properties(&self.properties), username)
    }

    async fn verify(&self, username: &str, password: &str) -> Result<(), AuthFailure> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthFailure::InputRejected);
        }

        let settings = LdapSettings::from_properties(&self.properties);
        let query = UserQuery::build(&settings, username);

        let mut session = self
            .connector
            .open(&query.service_url, &settings.query_bind())
            .await
            .map_err(|e| {
                error!(
                    "Query identity bind to {} as {} failed: {}",
                    query.service_url, settings.query_username, e
                );
                AuthFailure::from(e)
            })?;

        let outcome = find_user(session.as_mut(), username, password, &query).await;

        close_session(session.as_mut()).await;

        outcome
    }
}

async fn find_user(
    session: &mut dyn DirectorySession,
    username: &str,
    password: &str,
    query: &UserQuery,
) -> Result<(), AuthFailure> {
    session.rebind(username, password).await?;

    let entries = session
        .search(&query.search_base, &query.filter, SearchScope::Subtree)
        .await?;

    if entries.is_empty() {
        return Err(AuthFailure::UserNotFound);
    }

    debug!("Found {} matching entries, first DN: {}", entries.len(), entries[0].dn);
    Ok(())
}

#[async_trait]
impl Authenticator for DirectoryAuthenticator {
    async fn is_authenticated(&self, username: &str, password: &str) -> bool {
        match self.verify(username, password).await {
            Ok(()) => {
                info!("Directory authentication succeeded for {}", username);
                true
            }
            Err(AuthFailure::InputRejected) => {
                debug!("{}", AuthFailure::InputRejected);
                false
            }
            Err(failure) => {
                warn!("Directory authentication denied for {}: {}", username, failure);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldap::error::{DirectoryError, DirectoryResult};
    use crate::ldap::types::{keys, BindOptions, DirectoryEntry};
    use parking_lot::Mutex;

    /// What the fake directory answers at each step
    #[derive(Clone)]
    struct Script {
        open: DirectoryResult<()>,
        rebind: DirectoryResult<()>,
        search: DirectoryResult<usize>,
        close: DirectoryResult<()>,
    }

    impl Default for Script {
        fn default() -> Self {
            Self {
                open: Ok(()),
                rebind: Ok(()),
                search: Ok(1),
                close: Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct Calls {
        opens: Vec<(String, BindOptions)>,
        rebinds: Vec<(String, String)>,
        searches: Vec<(String, String, SearchScope)>,
        closes: usize,
    }

    #[derive(Clone, Default)]
    struct FakeConnector {
        script: Script,
        calls: Arc<Mutex<Calls>>,
    }

    impl FakeConnector {
        fn scripted(script: Script) -> Self {
            Self {
                script,
                calls: Arc::default(),
            }
        }
    }

    struct FakeSession {
        script: Script,
        calls: Arc<Mutex<Calls>>,
    }

    #[async_trait]
    impl DirectoryConnector for FakeConnector {
        async fn open(
            &self,
            service_url: &str,
            bind: &BindOptions,
        ) -> DirectoryResult<Box<dyn DirectorySession>> {
            self.calls
                .lock()
                .opens
                .push((service_url.to_string(), bind.clone()));
            self.script.open.clone()?;

            Ok(Box::new(FakeSession {
                script: self.script.clone(),
                calls: self.calls.clone(),
            }))
        }
    }

    #[async_trait]
    impl DirectorySession for FakeSession {
        async fn rebind(&mut self, principal: &str, credentials: &str) -> DirectoryResult<()> {
            self.calls
                .lock()
                .rebinds
                .push((principal.to_string(), credentials.to_string()));
            self.script.rebind.clone()
        }

        async fn search(
            &mut self,
            base: &str,
            filter: &str,
            scope: SearchScope,
        ) -> DirectoryResult<Vec<DirectoryEntry>> {
            self.calls
                .lock()
                .searches
                .push((base.to_string(), filter.to_string(), scope));
            let count = self.script.search.clone()?;
            Ok((0..count)
                .map(|i| DirectoryEntry::new(format!("CN=user{},DC=corp", i)))
                .collect())
        }

        async fn close(&mut self) -> DirectoryResult<()> {
            self.calls.lock().closes += 1;
            self.script.close.clone()
        }
    }

    fn properties() -> Properties {
        Properties::new()
            .with(keys::DOMAIN_NAME, "corp.example.org")
            .with(keys::SERVER_NAME, "ldap1")
            .with(keys::USERNAME_ATTRIBUTE, "uid")
            .with(keys::QUERY_USERNAME, "svc-query")
            .with(keys::QUERY_PASSWORD, "svc-secret")
    }

    fn authenticator(props: Properties, connector: &FakeConnector) -> DirectoryAuthenticator {
        DirectoryAuthenticator::new(props, Arc::new(connector.clone()))
    }

    #[tokio::test]
    async fn test_missing_credentials_make_no_calls() {
        let connector = FakeConnector::default();
        let auth = authenticator(properties(), &connector);

        assert!(!auth.is_authenticated("", "password").await);
        assert!(!auth.is_authenticated("username", "").await);
        assert!(!auth.is_authenticated("", "").await);

        let calls = connector.calls.lock();
        assert!(calls.opens.is_empty());
        assert_eq!(calls.closes, 0);
    }

    #[tokio::test]
    async fn test_authenticated_with_group() {
        let connector = FakeConnector::default();
        let props = properties().with(keys::SECURITY_GROUP, "Admins");
        let auth = authenticator(props, &connector);

        assert!(auth.is_authenticated("alice", "secret").await);

        let calls = connector.calls.lock();
        assert_eq!(calls.opens.len(), 1);
        let (url, bind) = &calls.opens[0];
        assert_eq!(url, "ldaps://ldap1.corp.example.org/");
        assert_eq!(bind, &BindOptions::simple("svc-query", "svc-secret"));

        assert_eq!(
            calls.rebinds,
            vec![("alice".to_string(), "secret".to_string())]
        );

        assert_eq!(calls.searches.len(), 1);
        let (base, filter, scope) = &calls.searches[0];
        assert_eq!(base, "DC=corp,DC=example,DC=org");
        assert_eq!(*scope, SearchScope::Subtree);
        assert!(filter.contains("(uid=alice)"));
        assert!(filter.contains("(objectClass=user)"));
        assert!(filter.contains("(userPrincipalName=alice@corp.example.org)"));
        assert!(filter
            .contains("(memberOf=CN=Admins,OU=Security Groups,DC=corp,DC=example,DC=org)"));
        assert!(ldap3::parse_filter(filter).is_ok());

        assert_eq!(calls.closes, 1);
    }

    #[tokio::test]
    async fn test_no_group_clause_without_group() {
        let connector = FakeConnector::default();
        let auth = authenticator(properties(), &connector);

        assert!(auth.is_authenticated("alice", "secret").await);

        let calls = connector.calls.lock();
        assert!(!calls.searches[0].1.contains("memberOf"));
    }

    #[tokio::test]
    async fn test_service_bind_failure_skips_search() {
        for err in [
            DirectoryError::AuthenticationFailed("49".into()),
            DirectoryError::NamingFailure("host unreachable".into()),
        ] {
            let connector = FakeConnector::scripted(Script {
                open: Err(err),
                ..Default::default()
            });
            let auth = authenticator(properties(), &connector);

            assert!(!auth.is_authenticated("alice", "secret").await);

            let calls = connector.calls.lock();
            assert_eq!(calls.opens.len(), 1);
            assert!(calls.rebinds.is_empty());
            assert!(calls.searches.is_empty());
            assert_eq!(calls.closes, 0);
        }
    }

    #[tokio::test]
    async fn test_wrong_password_denied() {
        let connector = FakeConnector::scripted(Script {
            rebind: Err(DirectoryError::AuthenticationFailed("invalidCredentials".into())),
            ..Default::default()
        });
        let auth = authenticator(properties(), &connector);

        assert!(!auth.is_authenticated("alice", "wrong").await);

        let calls = connector.calls.lock();
        assert!(calls.searches.is_empty());
        assert_eq!(calls.closes, 1);
    }

    #[tokio::test]
    async fn test_empty_search_denied() {
        let connector = FakeConnector::scripted(Script {
            search: Ok(0),
            ..Default::default()
        });
        let auth = authenticator(properties(), &connector);

        assert!(!auth.is_authenticated("alice", "secret").await);
        assert_eq!(connector.calls.lock().closes, 1);
    }

    #[tokio::test]
    async fn test_several_entries_authenticate() {
        let connector = FakeConnector::scripted(Script {
            search: Ok(3),
            ..Default::default()
        });
        let auth = authenticator(properties(), &connector);

        assert!(auth.is_authenticated("alice", "secret").await);
    }

    #[tokio::test]
    async fn test_search_failure_denied_and_closed() {
        let connector = FakeConnector::scripted(Script {
            search: Err(DirectoryError::NamingFailure("noSuchObject".into())),
            ..Default::default()
        });
        let auth = authenticator(properties(), &connector);

        assert!(!auth.is_authenticated("alice", "secret").await);
        assert_eq!(connector.calls.lock().closes, 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_change_result() {
        let connector = FakeConnector::scripted(Script {
            close: Err(DirectoryError::NamingFailure("connection reset".into())),
            ..Default::default()
        });
        let auth = authenticator(properties(), &connector);

        assert!(auth.is_authenticated("alice", "secret").await);
        assert_eq!(connector.calls.lock().closes, 1);
    }

    #[tokio::test]
    async fn test_session_closed_once_per_call() {
        let connector = FakeConnector::default();
        let auth = authenticator(properties(), &connector);

        for _ in 0..3 {
            auth.is_authenticated("alice", "secret").await;
        }

        let calls = connector.calls.lock();
        assert_eq!(calls.opens.len(), 3);
        assert_eq!(calls.closes, 3);
    }

    #[tokio::test]
    async fn test_missing_configuration_degrades_to_empty() {
        let connector = FakeConnector::default();
        let auth = authenticator(Properties::new(), &connector);

        // The fake directory accepts anything; only the composed strings matter here
        assert!(auth.is_authenticated("alice", "secret").await);

        let calls = connector.calls.lock();
        assert_eq!(calls.opens[0].0, "ldaps://./");
        assert_eq!(calls.opens[0].1, BindOptions::simple("", ""));
        assert_eq!(calls.searches[0].0, "");
        assert_eq!(
            calls.searches[0].1,
            "(&(=alice)(objectClass=user)(userPrincipalName=alice@))"
        );
    }

    #[tokio::test]
    async fn test_verify_reports_cause() {
        let connector = FakeConnector::scripted(Script {
            search: Ok(0),
            ..Default::default()
        });
        let auth = authenticator(properties(), &connector);

        assert_eq!(auth.verify("", "x").await, Err(AuthFailure::InputRejected));
        assert_eq!(
            auth.verify("alice", "secret").await,
            Err(AuthFailure::UserNotFound)
        );
    }

    #[test]
    fn test_user_query_preview() {
        let auth = DirectoryAuthenticator::with_ldap3(properties());
        let query = auth.user_query("bob");

        assert_eq!(query.search_base, "DC=corp,DC=example,DC=org");
        assert!(query.filter.starts_with("(&(uid=bob)"));
    }
}
