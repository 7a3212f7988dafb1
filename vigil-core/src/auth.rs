//! Collaborator seams for the authentication flow
//!
//! The governor never checks credentials, persists sessions, or tears down
//! remote state itself; it delegates through the traits in this module.
//! Implementations typically wrap an identity provider SDK or an HTTP
//! backend, and are injected once at startup.

use async_trait::async_trait;
use thiserror::Error;

use crate::{account::AccountId, error::Error, events::AuthMode};

/// The authenticated identity returned by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub display_name: Option<String>,
}

impl Principal {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            display_name: None,
        }
    }
}

/// A failed credential check.
///
/// The `code` is machine-readable (e.g. `auth/wrong-password`) and is written
/// verbatim into the audit log as the failure diagnostic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code}")]
pub struct VerificationError {
    pub code: String,
}

impl VerificationError {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Checks a credential proof against the identity provider.
#[async_trait]
pub trait CredentialVerifier: Send + Sync + 'static {
    async fn verify(
        &self,
        account_id: &AccountId,
        proof: &str,
    ) -> Result<Principal, VerificationError>;
}

/// Selects how long the resulting session survives process restarts.
///
/// Applied as a precondition before credential verification; a failure here
/// counts as a failed attempt.
#[async_trait]
pub trait PersistenceSelector: Send + Sync + 'static {
    async fn apply_mode(&self, mode: AuthMode) -> Result<(), Error>;
}

/// Best-effort remote session teardown.
///
/// Invoked by both explicit sign-out and inactivity expiry. Failures are
/// logged by the caller and never block local teardown.
#[async_trait]
pub trait SignOutHook: Send + Sync + 'static {
    async fn sign_out(&self) -> Result<(), Error>;
}
