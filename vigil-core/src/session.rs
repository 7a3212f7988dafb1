//! Session records
//!
//! A [`Session`] is created by the governor after a successful credential
//! check. It is a process-local record; how long it survives restarts is the
//! persistence selector's concern, recorded here only as the `auth_mode`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{account::AccountId, events::AuthMode};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The unique identifier for the session.
    pub id: SessionId,

    /// The account the session belongs to.
    pub account_id: AccountId,

    /// How the session is persisted across restarts.
    pub auth_mode: AuthMode,

    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(account_id: AccountId, auth_mode: AuthMode) -> Self {
        Self {
            id: SessionId::new_random(),
            account_id,
            auth_mode,
            created_at: Utc::now(),
        }
    }
}
