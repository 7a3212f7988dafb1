//! Authentication governor.
//!
//! Orchestrates a login attempt: consults the block policy over the replayed
//! audit log before any credential check, records the outcome as audit
//! events, escalates to a block event when the failure threshold is crossed,
//! and arms the inactivity watcher on success.
//!
//! The audit trail is best-effort: a failed append is logged at `warn` and
//! never changes the authentication result. Concurrent attempts for the same
//! account are not serialized; both may pass the policy check before either
//! outcome is recorded, which at worst delays a block by one attempt since
//! the log is append-only.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    account::AccountId,
    auth::{CredentialVerifier, PersistenceSelector, SignOutHook},
    config::ThresholdConfig,
    error::{AuthError, Error},
    events::{AuditEvent, AuthMode},
    repositories::{AuditLogRepository, ParameterRepository},
    services::{
        lifecycle::{ActivitySignalSource, SessionLifecycleManager},
        policy::{Verdict, decide},
        reconstructor::AttemptReconstructor,
    },
    session::Session,
};

pub struct AuthenticationGovernor<A, P, V, S>
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
    reconstructor: AttemptReconstructor<A>,
    lifecycle: Arc<SessionLifecycleManager>,
    activity: Arc<dyn ActivitySignalSource>,
    sign_out_hook: Arc<dyn SignOutHook>,
}

impl<A, P, V, S> AuthenticationGovernor<A, P, V, S>
where
    A: AuditLogRepository,
    P: ParameterRepository,
    V: CredentialVerifier,
    S: PersistenceSelector,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        audit_log: Arc<A>,
        parameters: Arc<P>,
        verifier: Arc<V>,
        persistence: Arc<S>,
        lifecycle: Arc<SessionLifecycleManager>,
        activity: Arc<dyn ActivitySignalSource>,
        sign_out_hook: Arc<dyn SignOutHook>,
    ) -> Self {
        let reconstructor = AttemptReconstructor::new(Arc::clone(&audit_log));
        Self {
            audit_log,
            parameters,
            verifier,
            persistence,
            reconstructor,
            lifecycle,
            activity,
            sign_out_hook,
        }
    }

    /// Attempt a login.
    ///
    /// The block policy runs over the replayed audit log before the
    /// credential check. Every branch appends exactly one audit event,
    /// except a newly crossed threshold which appends two (the failure, then
    /// the block).
    pub async fn login(
        &self,
        account_id: &AccountId,
        proof: &str,
        mode: AuthMode,
    ) -> Result<Session, Error> {
        let config = ThresholdConfig::load(self.parameters.as_ref()).await?;

        let state = self.reconstructor.reconstruct(account_id).await?;
        if let Verdict::Blocked { until } = decide(&state, &config, Utc::now()) {
            self.append_best_effort(AuditEvent::login_failed(
                account_id.clone(),
                mode,
                format!("USER_BLOCKED until {}", until.to_rfc3339()),
            ))
            .await;
            return Err(AuthError::Blocked { until }.into());
        }

        if let Err(e) = self.persistence.apply_mode(mode).await {
            self.append_best_effort(AuditEvent::login_failed(
                account_id.clone(),
                mode,
                format!("setPersistence_failed: {e}"),
            ))
            .await;
            return Err(AuthError::PersistenceSelectionFailed(e.to_string()).into());
        }

        match self.verifier.verify(account_id, proof).await {
            Ok(principal) => {
                // The success event's position in the log is the reset; no
                // counter write is needed.
                self.append_best_effort(AuditEvent::login_success(account_id.clone(), mode))
                    .await;

                self.lifecycle
                    .arm(self.activity.subscribe(), Arc::clone(&self.sign_out_hook))
                    .await;

                Ok(Session::new(principal.account_id, mode))
            }
            Err(verification) => {
                self.append_best_effort(AuditEvent::login_failed(
                    account_id.clone(),
                    mode,
                    verification.code.clone(),
                ))
                .await;

                self.escalate_if_threshold_crossed(account_id, mode, &config)
                    .await;

                Err(AuthError::VerificationFailed(verification.code).into())
            }
        }
    }

    /// Reconstruct and decide without attempting a credential check.
    ///
    /// Lets a client render "retry after <time>" before asking for a
    /// password.
    pub async fn lockout_status(&self, account_id: &AccountId) -> Result<Verdict, Error> {
        let config = ThresholdConfig::load(self.parameters.as_ref()).await?;
        let state = self.reconstructor.reconstruct(account_id).await?;
        Ok(decide(&state, &config, Utc::now()))
    }

    /// Explicit sign-out: disarm the inactivity watcher, then run the remote
    /// teardown hook best-effort. Local teardown always completes.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.lifecycle.disarm().await;
        if let Err(e) = self.sign_out_hook.sign_out().await {
            tracing::warn!(error = %e, "Remote sign-out failed, local teardown proceeds");
        }
        Ok(())
    }

    /// Replay the log after a recorded failure and, when the verdict has
    /// become `ThresholdCrossed`, append the block event carrying the new
    /// expiry. Failures here are logged and swallowed; the caller propagates
    /// the original verification error regardless.
    async fn escalate_if_threshold_crossed(
        &self,
        account_id: &AccountId,
        mode: AuthMode,
        config: &ThresholdConfig,
    ) {
        match self.reconstructor.reconstruct(account_id).await {
            Ok(state) => {
                if let Verdict::ThresholdCrossed { block_until } =
                    decide(&state, config, Utc::now())
                {
                    self.append_best_effort(AuditEvent::user_blocked(
                        account_id.clone(),
                        mode,
                        block_until,
                    ))
                    .await;
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    account = %account_id,
                    "Failed to replay attempt history after login failure"
                );
            }
        }
    }

    async fn append_best_effort(&self, event: AuditEvent) {
        if let Err(e) = self.audit_log.append(&event).await {
            tracing::warn!(
                error = %e,
                account = %event.account_id,
                kind = ?event.kind,
                "Failed to append audit event"
            );
        }
    }
}
