//! Attempt reconstruction from the audit log.
//!
//! Instead of maintaining a mutable failed-attempt counter, the governor
//! derives the account's state by replaying its audit events on every check.
//! The replay is a pure function over a sorted event slice; the service
//! wrapper owns the repository read and the fail-open policy for denied
//! reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    account::AccountId,
    error::{Error, StorageError},
    events::{AuditEvent, AuditEventKind},
    repositories::AuditLogRepository,
};

/// Derived attempt state for one account. Recomputed on every login check,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconstructedAttemptState {
    /// Failures strictly after the most recent success, or all failures if
    /// the account has never succeeded.
    pub failed_count: u32,

    /// Timestamp of the most recent counted failure.
    pub last_failure_at: Option<DateTime<Utc>>,

    /// Expiry of the most recent block event anywhere in the log.
    pub blocked_until: Option<DateTime<Utc>>,
}

/// Replay a log slice into derived attempt state.
///
/// `events` must already be in non-decreasing timestamp order.
///
/// The block scan is deliberately independent of the success scan: a
/// `UserBlocked` event older than a later `LoginSuccess` still surfaces its
/// expiry. Historical logs are interpreted under this rule, so changing it
/// changes the meaning of already-written journals; see DESIGN.md.
pub fn replay(events: &[AuditEvent]) -> ReconstructedAttemptState {
    let last_success = events
        .iter()
        .rposition(|e| e.kind == AuditEventKind::LoginSuccess);

    let tail = match last_success {
        Some(index) => &events[index + 1..],
        None => events,
    };

    let mut failed_count = 0u32;
    let mut last_failure_at = None;
    for event in tail {
        if event.kind == AuditEventKind::LoginFailed {
            failed_count += 1;
            last_failure_at = Some(event.timestamp);
        }
    }

    let blocked_until = events.iter().rev().find_map(AuditEvent::block_expiry);

    ReconstructedAttemptState {
        failed_count,
        last_failure_at,
        blocked_until,
    }
}

/// Read-only service that reconstructs attempt state for an account.
pub struct AttemptReconstructor<R: AuditLogRepository> {
    repository: Arc<R>,
}

impl<R: AuditLogRepository> AttemptReconstructor<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Reconstruct the attempt state for `account_id`. No side effects.
    ///
    /// A permission-denied log read yields an empty state, as if the account
    /// had no history: a locked-down audit log must not block logins. Every
    /// other read failure propagates.
    pub async fn reconstruct(
        &self,
        account_id: &AccountId,
    ) -> Result<ReconstructedAttemptState, Error> {
        let mut events = match self.repository.events_for_account(account_id).await {
            Ok(events) => events,
            Err(Error::Storage(StorageError::PermissionDenied(reason))) => {
                tracing::warn!(
                    account = %account_id,
                    reason = %reason,
                    "Audit log read denied, treating account as having no history"
                );
                return Ok(ReconstructedAttemptState::default());
            }
            Err(e) => return Err(e),
        };

        // Stable sort: events sharing a timestamp keep log-insertion order.
        events.sort_by_key(|e| e.timestamp);

        Ok(replay(&events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AuthMode, EventReason};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn event(kind: AuditEventKind, at: DateTime<Utc>, reason: Option<EventReason>) -> AuditEvent {
        AuditEvent {
            account_id: "user@example.com".into(),
            kind,
            timestamp: at,
            auth_mode: AuthMode::Session,
            reason,
        }
    }

    fn failed(at: DateTime<Utc>) -> AuditEvent {
        event(
            AuditEventKind::LoginFailed,
            at,
            Some(EventReason::Diagnostic("auth/wrong-password".into())),
        )
    }

    fn success(at: DateTime<Utc>) -> AuditEvent {
        event(AuditEventKind::LoginSuccess, at, None)
    }

    fn blocked(at: DateTime<Utc>, until: DateTime<Utc>) -> AuditEvent {
        event(
            AuditEventKind::UserBlocked,
            at,
            Some(EventReason::BlockedUntil(until)),
        )
    }

    #[test]
    fn test_empty_log_yields_default_state() {
        assert_eq!(replay(&[]), ReconstructedAttemptState::default());
    }

    #[test]
    fn test_counts_all_failures_without_success() {
        let t = base();
        let events: Vec<_> = (0..5).map(|i| failed(t + Duration::seconds(i))).collect();
        let state = replay(&events);
        assert_eq!(state.failed_count, 5);
        assert_eq!(state.last_failure_at, Some(t + Duration::seconds(4)));
        assert_eq!(state.blocked_until, None);
    }

    #[test]
    fn test_success_resets_the_count() {
        let t = base();
        let events = vec![
            failed(t),
            failed(t + Duration::seconds(1)),
            success(t + Duration::seconds(2)),
            failed(t + Duration::seconds(3)),
        ];
        let state = replay(&events);
        assert_eq!(state.failed_count, 1);
        assert_eq!(state.last_failure_at, Some(t + Duration::seconds(3)));
    }

    #[test]
    fn test_failed_count_zero_immediately_after_success() {
        let t = base();
        let events = vec![failed(t), failed(t + Duration::seconds(1)), success(t + Duration::seconds(2))];
        let state = replay(&events);
        assert_eq!(state.failed_count, 0);
        assert_eq!(state.last_failure_at, None);
    }

    #[test]
    fn test_block_event_does_not_reset_the_count() {
        let t = base();
        let until = t + Duration::minutes(30);
        let events = vec![
            failed(t),
            failed(t + Duration::seconds(1)),
            blocked(t + Duration::seconds(2), until),
        ];
        let state = replay(&events);
        assert_eq!(state.failed_count, 2);
        assert_eq!(state.blocked_until, Some(until));
    }

    #[test]
    fn test_most_recent_block_wins() {
        let t = base();
        let events = vec![
            blocked(t, t + Duration::minutes(30)),
            blocked(t + Duration::minutes(1), t + Duration::minutes(45)),
        ];
        let state = replay(&events);
        assert_eq!(state.blocked_until, Some(t + Duration::minutes(45)));
    }

    #[test]
    fn test_blocked_until_survives_later_success() {
        // The block scan ignores the success scan on purpose, so an old
        // block event still reports its expiry after the account has since
        // logged in. The policy layer handles the expiry check.
        let t = base();
        let until = t + Duration::minutes(30);
        let events = vec![blocked(t, until), success(t + Duration::minutes(1))];
        let state = replay(&events);
        assert_eq!(state.failed_count, 0);
        assert_eq!(state.blocked_until, Some(until));
    }

    #[test]
    fn test_block_with_unparsable_reason_is_ignored() {
        let t = base();
        let events = vec![event(
            AuditEventKind::UserBlocked,
            t,
            Some(EventReason::Diagnostic("manual".into())),
        )];
        assert_eq!(replay(&events).blocked_until, None);
    }

    struct StubAuditLog {
        events: Vec<AuditEvent>,
        deny: bool,
    }

    #[async_trait]
    impl AuditLogRepository for StubAuditLog {
        async fn append(&self, _event: &AuditEvent) -> Result<(), Error> {
            unimplemented!("reconstructor never writes")
        }

        async fn events_for_account(
            &self,
            _account_id: &AccountId,
        ) -> Result<Vec<AuditEvent>, Error> {
            if self.deny {
                return Err(StorageError::PermissionDenied("journal".into()).into());
            }
            Ok(self.events.clone())
        }
    }

    #[tokio::test]
    async fn test_reconstruct_sorts_out_of_order_events() {
        let t = base();
        // Store returns the success last even though it happened first.
        let repo = Arc::new(StubAuditLog {
            events: vec![failed(t + Duration::seconds(1)), success(t)],
            deny: false,
        });
        let state = AttemptReconstructor::new(repo)
            .reconstruct(&"user@example.com".into())
            .await
            .unwrap();
        assert_eq!(state.failed_count, 1);
    }

    #[tokio::test]
    async fn test_reconstruct_is_idempotent() {
        let t = base();
        let repo = Arc::new(StubAuditLog {
            events: vec![failed(t), success(t + Duration::seconds(1)), failed(t + Duration::seconds(2))],
            deny: false,
        });
        let reconstructor = AttemptReconstructor::new(repo);
        let account = "user@example.com".into();
        let first = reconstructor.reconstruct(&account).await.unwrap();
        let second = reconstructor.reconstruct(&account).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_denied_read_fails_open_to_empty_state() {
        let repo = Arc::new(StubAuditLog {
            events: vec![],
            deny: true,
        });
        let state = AttemptReconstructor::new(repo)
            .reconstruct(&"user@example.com".into())
            .await
            .unwrap();
        assert_eq!(state, ReconstructedAttemptState::default());
    }
}
