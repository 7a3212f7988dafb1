//! Repository traits for data access
//!
//! These traits abstract the two stores the governor reads and writes: the
//! append-only audit log and the key/value parameter source. Storage backends
//! implement them; services consume them through `Arc<R>` with generic
//! bounds, so a backend only needs to implement what it actually provides.

pub mod audit_log;
pub mod parameter;

pub use audit_log::AuditLogRepository;
pub use parameter::ParameterRepository;
