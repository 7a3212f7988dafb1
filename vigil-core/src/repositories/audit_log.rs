//! Repository trait for the audit log.

use async_trait::async_trait;

use crate::{account::AccountId, error::Error, events::AuditEvent};

/// Append-only, per-account store of authentication events.
///
/// Implementations must never update or delete events; the reconstructor
/// depends on the log being a complete history. Events should be returned in
/// log-insertion order — callers sort by timestamp themselves, and insertion
/// order is the tiebreak for identical timestamps.
#[async_trait]
pub trait AuditLogRepository: Send + Sync + 'static {
    /// Append one event to the log.
    ///
    /// Callers on the login path treat failures as best-effort (logged,
    /// never overriding the authentication outcome), so implementations
    /// should not retry internally.
    async fn append(&self, event: &AuditEvent) -> Result<(), Error>;

    /// All events recorded for an account, in insertion order.
    ///
    /// An account with no history yields an empty vector, not an error.
    /// A read denied by the store's access control must surface as
    /// [`StorageError::PermissionDenied`](crate::error::StorageError) so the
    /// reconstructor can fail open.
    async fn events_for_account(&self, account_id: &AccountId) -> Result<Vec<AuditEvent>, Error>;
}
