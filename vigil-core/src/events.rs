//! Audit event model
//!
//! Every authentication outcome is recorded as an immutable [`AuditEvent`] in
//! an append-only, per-account log. The governor is the only writer; nothing
//! ever updates or deletes an event. All derived state (failed-attempt
//! counts, block windows) is recomputed from the log on read, so the log is
//! the single source of truth for lockout decisions.
//!
//! | Field        | Type                  | Description                                         |
//! | ------------ | --------------------- | --------------------------------------------------- |
//! | `account_id` | `AccountId`           | The account the event belongs to.                   |
//! | `kind`       | `AuditEventKind`      | What happened.                                      |
//! | `timestamp`  | `DateTime<Utc>`       | Event-generation time, not log-insertion time.      |
//! | `auth_mode`  | `AuthMode`            | How the resulting session would have been persisted.|
//! | `reason`     | `Option<EventReason>` | Diagnostic, or the block expiry for `UserBlocked`.  |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// What an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventKind {
    LoginSuccess,
    LoginFailed,
    UserBlocked,
}

/// How long the session resulting from a login attempt survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMode {
    /// Survives process restarts.
    Persistent,
    /// Survives until the hosting process or browser session ends.
    Session,
    /// In-memory only.
    Ephemeral,
}

/// Structured payload carried in an event's free-text `reason` field.
///
/// Historically the block expiry was smuggled through the diagnostic string
/// as `USER_BLOCKED:<rfc3339>` (or a bare instant). Modeling the two cases as
/// a tagged variant keeps the parsing in one place; the legacy storage shape
/// is preserved through the `From<String>`/`Into<String>` serde bridge. An
/// expiry that fails to parse decodes as a plain diagnostic, so a corrupt
/// record degrades to "no block" rather than a permanent lockout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventReason {
    /// Free-text diagnostic, e.g. a verifier error code.
    Diagnostic(String),
    /// The instant a block window ends. Only meaningful on `UserBlocked`.
    BlockedUntil(DateTime<Utc>),
}

const BLOCK_EXPIRY_PREFIX: &str = "USER_BLOCKED:";

impl From<String> for EventReason {
    fn from(raw: String) -> Self {
        let candidate = raw.strip_prefix(BLOCK_EXPIRY_PREFIX).unwrap_or(&raw);
        match DateTime::parse_from_rfc3339(candidate) {
            Ok(instant) => EventReason::BlockedUntil(instant.with_timezone(&Utc)),
            Err(_) => EventReason::Diagnostic(raw),
        }
    }
}

impl From<EventReason> for String {
    fn from(reason: EventReason) -> Self {
        match reason {
            EventReason::Diagnostic(text) => text,
            EventReason::BlockedUntil(until) => {
                format!("{BLOCK_EXPIRY_PREFIX}{}", until.to_rfc3339())
            }
        }
    }
}

impl std::fmt::Display for EventReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventReason::Diagnostic(text) => write!(f, "{text}"),
            EventReason::BlockedUntil(until) => {
                write!(f, "{BLOCK_EXPIRY_PREFIX}{}", until.to_rfc3339())
            }
        }
    }
}

/// An immutable fact recording one authentication-related occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub account_id: AccountId,
    pub kind: AuditEventKind,
    pub timestamp: DateTime<Utc>,
    pub auth_mode: AuthMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EventReason>,
}

impl AuditEvent {
    /// Record a successful login. Success events carry no reason; their
    /// position in the log is what resets the failure count.
    pub fn login_success(account_id: AccountId, auth_mode: AuthMode) -> Self {
        Self {
            account_id,
            kind: AuditEventKind::LoginSuccess,
            timestamp: Utc::now(),
            auth_mode,
            reason: None,
        }
    }

    /// Record a failed login with a machine-readable diagnostic.
    pub fn login_failed(
        account_id: AccountId,
        auth_mode: AuthMode,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            kind: AuditEventKind::LoginFailed,
            timestamp: Utc::now(),
            auth_mode,
            reason: Some(EventReason::Diagnostic(diagnostic.into())),
        }
    }

    /// Record the start of a block window ending at `until`.
    pub fn user_blocked(account_id: AccountId, auth_mode: AuthMode, until: DateTime<Utc>) -> Self {
        Self {
            account_id,
            kind: AuditEventKind::UserBlocked,
            timestamp: Utc::now(),
            auth_mode,
            reason: Some(EventReason::BlockedUntil(until)),
        }
    }

    /// The block expiry this event establishes, if any.
    pub fn block_expiry(&self) -> Option<DateTime<Utc>> {
        match (&self.kind, &self.reason) {
            (AuditEventKind::UserBlocked, Some(EventReason::BlockedUntil(until))) => Some(*until),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reason_decodes_prefixed_expiry() {
        let reason = EventReason::from("USER_BLOCKED:2025-06-01T12:00:00+00:00".to_string());
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(reason, EventReason::BlockedUntil(expected));
    }

    #[test]
    fn test_reason_decodes_bare_instant() {
        let reason = EventReason::from("2025-06-01T12:00:00Z".to_string());
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(reason, EventReason::BlockedUntil(expected));
    }

    #[test]
    fn test_unparsable_expiry_degrades_to_diagnostic() {
        // Fail open: a mangled expiry must not manufacture a block window.
        let reason = EventReason::from("USER_BLOCKED:not-a-date".to_string());
        assert_eq!(
            reason,
            EventReason::Diagnostic("USER_BLOCKED:not-a-date".to_string())
        );

        let reason = EventReason::from("auth/wrong-password".to_string());
        assert_eq!(
            reason,
            EventReason::Diagnostic("auth/wrong-password".to_string())
        );
    }

    #[test]
    fn test_reason_round_trips_legacy_shape() {
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let encoded: String = EventReason::BlockedUntil(until).into();
        assert_eq!(encoded, "USER_BLOCKED:2025-06-01T12:00:00+00:00");
        assert_eq!(
            EventReason::from(encoded),
            EventReason::BlockedUntil(until)
        );
    }

    #[test]
    fn test_reason_display_matches_wire_shape() {
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let reason = EventReason::BlockedUntil(until);
        assert_eq!(
            reason.to_string(),
            "USER_BLOCKED:2025-06-01T12:00:00+00:00"
        );
        assert_eq!(reason.to_string(), String::from(reason.clone()));
    }

    #[test]
    fn test_event_json_round_trip() {
        let until = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let event = AuditEvent::user_blocked("user@example.com".into(), AuthMode::Session, until);

        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("USER_BLOCKED:2025-06-01T12:00:00+00:00"));

        let decoded: AuditEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.block_expiry(), Some(until));
        assert_eq!(decoded.kind, AuditEventKind::UserBlocked);
    }

    #[test]
    fn test_block_expiry_ignores_non_block_events() {
        let event = AuditEvent::login_failed(
            "user@example.com".into(),
            AuthMode::Ephemeral,
            "auth/wrong-password",
        );
        assert_eq!(event.block_expiry(), None);
    }

    #[test]
    fn test_success_carries_no_reason() {
        let event = AuditEvent::login_success("user@example.com".into(), AuthMode::Persistent);
        assert_eq!(event.kind, AuditEventKind::LoginSuccess);
        assert!(event.reason.is_none());

        let json = serde_json::to_string(&event).expect("serialize");
        assert!(!json.contains("reason"));
    }
}
