//! # Vigil
//!
//! Vigil is a login-attempt governor: it decides whether a login attempt may
//! proceed by replaying an append-only audit log instead of maintaining
//! mutable counters, creates a block window when too many attempts fail, and
//! signs an authenticated session out after a period of inactivity.
//!
//! Credential verification itself is an external collaborator — Vigil wraps
//! your identity provider, it does not replace it. You supply four seams
//! (audit log, parameter source, credential verifier, persistence selector)
//! plus a sign-out hook, and Vigil runs the policy around them:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil::{AuthMode, Vigil};
//! use vigil_storage_memory::{MemoryAuditLog, MemoryParameters};
//!
//! let vigil = Vigil::builder(
//!     Arc::new(MemoryAuditLog::new()),
//!     Arc::new(MemoryParameters::new()),
//!     Arc::new(MyVerifier),
//!     Arc::new(MyPersistenceSelector),
//!     Arc::new(MySignOutHook),
//! )
//! .build();
//!
//! match vigil.login(&"user@example.com".into(), "hunter2", AuthMode::Session).await {
//!     Ok(session) => println!("signed in as {}", session.account_id),
//!     Err(e) if e.blocked_until().is_some() => println!("blocked, retry later"),
//!     Err(e) => println!("login failed: {e}"),
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use vigil_core::services::{ActivityBroadcaster, AuthenticationGovernor, SessionLifecycleManager};

/// Re-export core types from vigil_core
///
/// These types are commonly used when working with the Vigil API.
pub use vigil_core::{
    AccountId, AuditEvent, AuditEventKind, AuthError, AuthMode, ConfigError, Error, EventReason,
    Principal, Session, SessionId, StorageError, ThresholdConfig, VerificationError,
    auth::{CredentialVerifier, PersistenceSelector, SignOutHook},
    repositories::{AuditLogRepository, ParameterRepository},
    services::{ActivitySignal, Verdict},
};

/// Re-export storage backends
///
/// Available when the corresponding feature is enabled.
#[cfg(feature = "memory")]
pub use vigil_storage_memory::{MemoryAuditLog, MemoryParameters};

/// Builder for a [`Vigil`] instance.
///
/// The five collaborators are required up front; the inactivity timeout is
/// the only optional knob and defaults to 30 minutes.
pub struct VigilBuilder<A, P, V, S>
where
    A: AuditLogRepository,
    P: ParameterRepository,
    V: CredentialVerifier,
    S: PersistenceSelector,
{
    audit_log: Arc<A>,
    parameters: Arc<P>,
    verifier: Arc<V>,
    persistence: Arc<S>,
    sign_out_hook: Arc<dyn SignOutHook>,
    inactivity_timeout: Duration,
}

impl<A, P, V, S> VigilBuilder<A, P, V, S>
where
    A: AuditLogRepository,
    P: ParameterRepository,
    V: CredentialVerifier,
    S: PersistenceSelector,
{
    pub fn new(
        audit_log: Arc<A>,
        parameters: Arc<P>,
        verifier: Arc<V>,
        persistence: Arc<S>,
        sign_out_hook: Arc<dyn SignOutHook>,
    ) -> Self {
        Self {
            audit_log,
            parameters,
            verifier,
            persistence,
            sign_out_hook,
            inactivity_timeout: SessionLifecycleManager::DEFAULT_INACTIVITY_TIMEOUT,
        }
    }

    /// Override the inactivity timeout after which an idle session is signed
    /// out.
    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn build(self) -> Vigil<A, P, V, S> {
        let activity = Arc::new(ActivityBroadcaster::new());
        let governor = AuthenticationGovernor::new(
            self.audit_log,
            self.parameters,
            self.verifier,
            self.persistence,
            Arc::new(SessionLifecycleManager::new(self.inactivity_timeout)),
            activity.clone(),
            self.sign_out_hook,
        );
        Vigil { governor, activity }
    }
}

/// The main entry point: a configured governor plus the activity channel
/// that keeps its sessions alive.
pub struct Vigil<A, P, V, S>
where
    A: AuditLogRepository,
    P: ParameterRepository,
    V: CredentialVerifier,
    S: PersistenceSelector,
{
    governor: AuthenticationGovernor<A, P, V, S>,
    activity: Arc<ActivityBroadcaster>,
}

impl<A, P, V, S> Vigil<A, P, V, S>
where
    A: AuditLogRepository,
    P: ParameterRepository,
    V: CredentialVerifier,
    S: PersistenceSelector,
{
    pub fn builder(
        audit_log: Arc<A>,
        parameters: Arc<P>,
        verifier: Arc<V>,
        persistence: Arc<S>,
        sign_out_hook: Arc<dyn SignOutHook>,
    ) -> VigilBuilder<A, P, V, S> {
        VigilBuilder::new(audit_log, parameters, verifier, persistence, sign_out_hook)
    }

    /// Attempt a login. See
    /// [`AuthenticationGovernor::login`](vigil_core::services::governor::AuthenticationGovernor::login).
    pub async fn login(
        &self,
        account_id: &AccountId,
        proof: &str,
        mode: AuthMode,
    ) -> Result<Session, Error> {
        self.governor.login(account_id, proof, mode).await
    }

    /// Current lockout verdict for an account, without a credential attempt.
    pub async fn lockout_status(&self, account_id: &AccountId) -> Result<Verdict, Error> {
        self.governor.lockout_status(account_id).await
    }

    /// Explicit sign-out: stops the inactivity watcher and runs the remote
    /// teardown hook best-effort.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.governor.sign_out().await
    }

    /// Report user activity, resetting the inactivity deadline of the armed
    /// session.
    pub fn report_activity(&self, signal: ActivitySignal) {
        self.activity.report(signal);
    }
}
