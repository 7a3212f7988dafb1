//! Repository trait for the external parameter source.

use async_trait::async_trait;

use crate::error::Error;

/// Key/value configuration store.
///
/// Implementations fail open to `fallback` when the stored value does not
/// parse as an integer; a read denied by access control surfaces as
/// [`StorageError::PermissionDenied`](crate::error::StorageError) and is
/// absorbed by the configuration loader. All other errors propagate.
#[async_trait]
pub trait ParameterRepository: Send + Sync + 'static {
    /// Read a named integer parameter, falling back on missing or
    /// unparsable values.
    async fn read_int(&self, name: &str, fallback: i64) -> Result<i64, Error>;
}
