//! In-memory storage backend for the vigil login governor.
//!
//! Backs the audit-log and parameter repositories with process-local maps.
//! Suitable for single-process deployments and integration tests; nothing is
//! durable across restarts.
//!
//! Both stores carry a `deny_reads` switch that makes every read fail with a
//! permission error, mirroring an access-controlled backing store (the
//! governor's fail-open paths exist precisely for that deployment shape).

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use vigil_core::{
    AccountId, AuditEvent, Error, StorageError,
    repositories::{AuditLogRepository, ParameterRepository},
};

/// Append-only audit log held in memory, one event vector per account.
#[derive(Default)]
pub struct MemoryAuditLog {
    events: DashMap<AccountId, Vec<AuditEvent>>,
    deny_reads: AtomicBool,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail with a permission error.
    pub fn set_deny_reads(&self, deny: bool) {
        self.deny_reads.store(deny, Ordering::SeqCst);
    }

    /// Number of events recorded for an account. Test and diagnostics
    /// helper; the governor only reads through the repository trait.
    pub fn event_count(&self, account_id: &AccountId) -> usize {
        self.events.get(account_id).map_or(0, |v| v.len())
    }
}

#[async_trait]
impl AuditLogRepository for MemoryAuditLog {
    async fn append(&self, event: &AuditEvent) -> Result<(), Error> {
        self.events
            .entry(event.account_id.clone())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn events_for_account(&self, account_id: &AccountId) -> Result<Vec<AuditEvent>, Error> {
        if self.deny_reads.load(Ordering::SeqCst) {
            return Err(StorageError::PermissionDenied("journal".to_string()).into());
        }
        Ok(self
            .events
            .get(account_id)
            .map(|v| v.value().clone())
            .unwrap_or_default())
    }
}

/// Key/value parameter store held in memory.
///
/// Values are stored as strings and parsed on read, matching external
/// parameter stores that hold untyped values; an unparsable value falls back
/// rather than failing the read.
#[derive(Default)]
pub struct MemoryParameters {
    values: DashMap<String, String>,
    deny_reads: AtomicBool,
}

impl MemoryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: &str, value: impl ToString) {
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Make every subsequent read fail with a permission error.
    pub fn set_deny_reads(&self, deny: bool) {
        self.deny_reads.store(deny, Ordering::SeqCst);
    }
}

#[async_trait]
impl ParameterRepository for MemoryParameters {
    async fn read_int(&self, name: &str, fallback: i64) -> Result<i64, Error> {
        if self.deny_reads.load(Ordering::SeqCst) {
            return Err(StorageError::PermissionDenied("parameters".to_string()).into());
        }
        let Some(raw) = self.values.get(name) else {
            return Ok(fallback);
        };
        match raw.trim().parse::<i64>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    parameter = name,
                    value = %raw.value(),
                    fallback = fallback,
                    "Parameter value is not an integer, using fallback"
                );
                Ok(fallback)
            }
        }
    }
}
