//! Directory connector and session
//!
//! [`DirectoryConnector`] opens one bound session per call. The session is
//! owned by the caller, which must [`close`](DirectorySession::close) it.
//! [`Ldap3Connector`] is the production implementation over `ldap3`.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, SearchEntry};
use tracing::{debug, warn};

use crate::ldap::error::{DirectoryError, DirectoryResult};
use crate::ldap::types::{
    BindMechanism, BindOptions, ConnectorSettings, DirectoryEntry, SearchScope,
};

/// Opens bound sessions against a directory service
#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    /// Connect to `service_url` and bind with `bind`
    ///
    /// Fails with [`DirectoryError::AuthenticationFailed`] when the bind is
    /// refused and [`DirectoryError::NamingFailure`] for anything else.
    async fn open(
        &self,
        service_url: &str,
        bind: &BindOptions,
    ) -> DirectoryResult<Box<dyn DirectorySession>>;
}

/// A live, exclusively owned directory connection
#[async_trait]
pub trait DirectorySession: Send {
    /// Replace the session's security context with a new identity
    async fn rebind(&mut self, principal: &str, credentials: &str) -> DirectoryResult<()>;

    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryEntry>>;

    async fn close(&mut self) -> DirectoryResult<()>;
}

/// Close `session`, logging a failure instead of returning it
pub(crate) async fn close_session(session: &mut dyn DirectorySession) -> bool {
    match session.close().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to close directory session: {}", e);
            false
        }
    }
}

// ============================================================================
// ldap3 implementation
// ============================================================================

/// Connector backed by `ldap3`; one TCP/TLS connection per `open`
#[derive(Debug, Clone, Default)]
pub struct Ldap3Connector {
    settings: ConnectorSettings,
}

impl Ldap3Connector {
    pub fn new(settings: ConnectorSettings) -> Self {
        Self { settings }
    }

    fn conn_settings(&self) -> LdapConnSettings {
        LdapConnSettings::new()
            .set_conn_timeout(self.settings.timeout)
            .set_no_tls_verify(self.settings.skip_tls_verify)
    }
}

#[async_trait]
impl DirectoryConnector for Ldap3Connector {
    async fn open(
        &self,
        service_url: &str,
        bind: &BindOptions,
    ) -> DirectoryResult<Box<dyn DirectorySession>> {
        debug!("Connecting to LDAP server: {}", service_url);

        let (conn, ldap) = LdapConnAsync::with_settings(self.conn_settings(), service_url)
            .await
            .map_err(|e| DirectoryError::NamingFailure(format!("Failed to connect: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection driver error: {}", e);
            }
        });

        let mut session = Ldap3Session { ldap, closed: false };

        if let Err(e) = session.bind(bind).await {
            // The connection is ours until the session is handed out
            close_session(&mut session).await;
            return Err(e);
        }

        Ok(Box::new(session))
    }
}

/// Session over an `ldap3` handle
pub struct Ldap3Session {
    ldap: Ldap,
    closed: bool,
}

impl Ldap3Session {
    async fn bind(&mut self, bind: &BindOptions) -> DirectoryResult<()> {
        match bind.mechanism {
            BindMechanism::Simple => {
                debug!(
                    "Binding as {} ({})",
                    bind.principal,
                    bind.mechanism.as_str()
                );
                self.ldap
                    .simple_bind(&bind.principal, &bind.credentials)
                    .await?
                    .success()?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DirectorySession for Ldap3Session {
    async fn rebind(&mut self, principal: &str, credentials: &str) -> DirectoryResult<()> {
        self.bind(&BindOptions::simple(principal, credentials)).await
    }

    async fn search(
        &mut self,
        base: &str,
        filter: &str,
        scope: SearchScope,
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        debug!("Searching {} with filter: {}", base, filter);

        // "1.1" requests no attributes; only the DN is needed
        let (rs, _res) = self
            .ldap
            .search(base, scope.into(), filter, vec!["1.1"])
            .await?
            .success()?;

        Ok(rs
            .into_iter()
            .map(|entry| DirectoryEntry::from(SearchEntry::construct(entry)))
            .collect())
    }

    async fn close(&mut self) -> DirectoryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.ldap.unbind().await.map_err(DirectoryError::from)
    }
}
