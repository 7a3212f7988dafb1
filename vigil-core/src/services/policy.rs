//! Block policy.
//!
//! A pure decision function over reconstructed attempt state. The check is
//! time-relative rather than a stored flag, so an expired block self-expires
//! without any write to the log.

use chrono::{DateTime, Utc};

use crate::{config::ThresholdConfig, services::reconstructor::ReconstructedAttemptState};

/// The policy's decision for a login attempt, made before any credential
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No active block, threshold not reached.
    Allow,
    /// An unexpired block window denies the attempt.
    Blocked { until: DateTime<Utc> },
    /// The failure threshold is reached and no block exists yet; the caller
    /// should create one ending at `block_until`.
    ThresholdCrossed { block_until: DateTime<Utc> },
}

/// Decide whether a login attempt may proceed.
pub fn decide(
    state: &ReconstructedAttemptState,
    config: &ThresholdConfig,
    now: DateTime<Utc>,
) -> Verdict {
    if let Some(until) = state.blocked_until {
        if until > now {
            return Verdict::Blocked { until };
        }
    }

    if state.failed_count >= config.max_failed_attempts {
        // Saturate rather than overflow on an extreme configured duration.
        let block_until = now
            .checked_add_signed(config.block_duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        return Verdict::ThresholdCrossed { block_until };
    }

    Verdict::Allow
}
