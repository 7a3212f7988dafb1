//! Threshold configuration
//!
//! The two lockout knobs are sourced from an external parameter store at
//! login time, with in-process defaults as the fallback. A login must never
//! hard-fail because the parameter store denied the read or held garbage;
//! only a genuinely unavailable store aborts the attempt.

use chrono::Duration;

use crate::{
    error::{ConfigError, Error, StorageError},
    repositories::ParameterRepository,
};

/// Parameter name for the failed-attempt threshold.
pub const MAX_FAILED_ATTEMPTS_PARAM: &str = "MAX_FAILED_ATTEMPTS";
/// Parameter name for the block-window length, in minutes.
pub const BLOCK_DURATION_MINUTES_PARAM: &str = "BLOCK_DURATION_MINUTES";

pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;
pub const DEFAULT_BLOCK_DURATION_MINUTES: i64 = 30;

/// Configuration for lockout behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdConfig {
    /// Failed attempts (since the last success) at which a block is created.
    pub max_failed_attempts: u32,

    /// How long a newly created block window lasts.
    pub block_duration: Duration,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            block_duration: Duration::minutes(DEFAULT_BLOCK_DURATION_MINUTES),
        }
    }
}

impl ThresholdConfig {
    pub fn new(max_failed_attempts: u32, block_duration: Duration) -> Self {
        Self {
            max_failed_attempts,
            block_duration,
        }
    }

    /// Load the thresholds from a parameter repository.
    ///
    /// Permission errors fall back to the built-in default for that key (the
    /// login path must not be blocked by a locked-down parameter store);
    /// implementations already fall back on parse errors. Any other failure
    /// surfaces as [`ConfigError::Unavailable`].
    pub async fn load<P: ParameterRepository>(parameters: &P) -> Result<Self, Error> {
        let max_failed = read_with_fallback(
            parameters,
            MAX_FAILED_ATTEMPTS_PARAM,
            DEFAULT_MAX_FAILED_ATTEMPTS as i64,
        )
        .await?;
        let block_minutes = read_with_fallback(
            parameters,
            BLOCK_DURATION_MINUTES_PARAM,
            DEFAULT_BLOCK_DURATION_MINUTES,
        )
        .await?;

        let block_duration = Duration::try_minutes(block_minutes).unwrap_or_else(|| {
            tracing::warn!(
                minutes = block_minutes,
                fallback = DEFAULT_BLOCK_DURATION_MINUTES,
                "Block duration out of range, using default"
            );
            Duration::minutes(DEFAULT_BLOCK_DURATION_MINUTES)
        });

        Ok(Self {
            max_failed_attempts: u32::try_from(max_failed)
                .unwrap_or(DEFAULT_MAX_FAILED_ATTEMPTS),
            block_duration,
        })
    }
}

async fn read_with_fallback<P: ParameterRepository>(
    parameters: &P,
    name: &str,
    fallback: i64,
) -> Result<i64, Error> {
    match parameters.read_int(name, fallback).await {
        Ok(value) => Ok(value),
        Err(Error::Storage(StorageError::PermissionDenied(reason))) => {
            tracing::warn!(
                parameter = name,
                fallback = fallback,
                reason = %reason,
                "Parameter read denied, using default"
            );
            Ok(fallback)
        }
        Err(e) => Err(ConfigError::Unavailable(e.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticParameters {
        max_failed: Result<i64, fn() -> Error>,
        block_minutes: Result<i64, fn() -> Error>,
    }

    #[async_trait]
    impl ParameterRepository for StaticParameters {
        async fn read_int(&self, name: &str, _fallback: i64) -> Result<i64, Error> {
            let slot = match name {
                MAX_FAILED_ATTEMPTS_PARAM => &self.max_failed,
                BLOCK_DURATION_MINUTES_PARAM => &self.block_minutes,
                other => panic!("unexpected parameter: {other}"),
            };
            match slot {
                Ok(v) => Ok(*v),
                Err(make) => Err(make()),
            }
        }
    }

    fn permission_denied() -> Error {
        StorageError::PermissionDenied("parameters".to_string()).into()
    }

    fn database_down() -> Error {
        StorageError::Database("connection refused".to_string()).into()
    }

    #[tokio::test]
    async fn test_load_reads_both_parameters() {
        let parameters = StaticParameters {
            max_failed: Ok(3),
            block_minutes: Ok(15),
        };
        let config = ThresholdConfig::load(&parameters).await.unwrap();
        assert_eq!(config.max_failed_attempts, 3);
        assert_eq!(config.block_duration, Duration::minutes(15));
    }

    #[tokio::test]
    async fn test_permission_denied_falls_back_per_key() {
        let parameters = StaticParameters {
            max_failed: Err(permission_denied),
            block_minutes: Ok(10),
        };
        let config = ThresholdConfig::load(&parameters).await.unwrap();
        assert_eq!(config.max_failed_attempts, DEFAULT_MAX_FAILED_ATTEMPTS);
        assert_eq!(config.block_duration, Duration::minutes(10));
    }

    #[tokio::test]
    async fn test_other_errors_abort_the_load() {
        let parameters = StaticParameters {
            max_failed: Ok(5),
            block_minutes: Err(database_down),
        };
        let result = ThresholdConfig::load(&parameters).await;
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_duration_falls_back() {
        // A value minutes-to-milliseconds cannot represent must not panic
        // the login path.
        let parameters = StaticParameters {
            max_failed: Ok(5),
            block_minutes: Ok(i64::MAX),
        };
        let config = ThresholdConfig::load(&parameters).await.unwrap();
        assert_eq!(
            config.block_duration,
            Duration::minutes(DEFAULT_BLOCK_DURATION_MINUTES)
        );
    }

    #[tokio::test]
    async fn test_negative_threshold_falls_back() {
        let parameters = StaticParameters {
            max_failed: Ok(-2),
            block_minutes: Ok(30),
        };
        let config = ThresholdConfig::load(&parameters).await.unwrap();
        assert_eq!(config.max_failed_attempts, DEFAULT_MAX_FAILED_ATTEMPTS);
    }

    #[test]
    fn test_defaults() {
        let config = ThresholdConfig::default();
        assert_eq!(config.max_failed_attempts, 5);
        assert_eq!(config.block_duration, Duration::minutes(30));
    }
}
