//! Service layer for the login governor
//!
//! This module contains the concrete services built on top of the repository
//! traits: log replay, the pure block policy, the login orchestration, and
//! the inactivity watcher.

pub mod governor;
pub mod lifecycle;
pub mod policy;
pub mod reconstructor;

pub use governor::AuthenticationGovernor;
pub use lifecycle::{
    ActivityBroadcaster, ActivitySignal, ActivitySignalSource, SessionLifecycleManager,
};
pub use policy::{Verdict, decide};
pub use reconstructor::{AttemptReconstructor, ReconstructedAttemptState, replay};
