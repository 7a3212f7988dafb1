//! Core functionality for the vigil login governor
//!
//! This crate derives an account's blocked/unblocked state purely by
//! replaying an append-only audit log, decides whether a login attempt may
//! proceed before any credential check, and auto-terminates authenticated
//! sessions after a period of inactivity.
//!
//! The moving parts, leaves first: [`repositories`] defines the audit-log
//! and parameter-store seams, [`services::reconstructor`] replays the log
//! into derived attempt state, [`services::policy`] turns that state into a
//! verdict, [`services::governor`] orchestrates the login flow around an
//! external credential verifier, and [`services::lifecycle`] owns the
//! inactivity sign-out timer.

pub mod account;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod repositories;
pub mod services;
pub mod session;

pub use account::AccountId;
pub use auth::{CredentialVerifier, PersistenceSelector, Principal, SignOutHook, VerificationError};
pub use config::ThresholdConfig;
pub use error::{AuthError, ConfigError, Error, StorageError};
pub use events::{AuditEvent, AuditEventKind, AuthMode, EventReason};
pub use session::{Session, SessionId};
