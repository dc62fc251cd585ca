//! Queue service client configuration.

use crate::error::ConfigurationError;
use crate::queue::WAIT_SECONDS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Region used when no region is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Maximum SQS message body size after encoding
pub const SQS_MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Standard AWS environment variable holding the access key ID
pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";

/// Standard AWS environment variable holding the secret access key
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// AWS SQS configuration
///
/// Credentials are taken as given. Resolving them from profiles, instance
/// metadata or the environment is left to whoever builds this struct.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    /// Override for the service endpoint, e.g. a LocalStack URL
    pub endpoint: Option<String>,
    /// HTTP request timeout; must exceed the long-poll wait
    pub request_timeout_seconds: u64,
}

impl SqsConfig {
    /// Create configuration for a region with static credentials
    pub fn with_credentials(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            ..Self::default()
        }
    }

    /// Default configuration with credentials from the environment
    ///
    /// Reads `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`. Credentials are
    /// only taken when both are set and non-empty; otherwise the result has
    /// none. Profiles, instance metadata and session tokens are not consulted.
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        match (read(ACCESS_KEY_ID_ENV), read(SECRET_ACCESS_KEY_ENV)) {
            (Some(access_key_id), Some(secret_access_key)) => {
                Self::with_credentials(DEFAULT_REGION, access_key_id, secret_access_key)
            }
            _ => Self::default(),
        }
    }

    /// Endpoint URL for the configured region, honouring any override
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://sqs.{}.amazonaws.com", self.region),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.region.is_empty() {
            return Err(ConfigurationError::Missing {
                key: "region".to_string(),
            });
        }

        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(ConfigurationError::Invalid {
                message: "access_key_id and secret_access_key must be set together".to_string(),
            });
        }

        if self.request_timeout_seconds <= WAIT_SECONDS {
            return Err(ConfigurationError::Invalid {
                message: format!(
                    "request_timeout_seconds must be greater than the {}s long-poll wait",
                    WAIT_SECONDS
                ),
            });
        }

        Ok(())
    }
}

impl Default for SqsConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            request_timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for SqsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqsConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint", &self.endpoint)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

/// In-memory queue service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryConfig {
    /// Region label reported by the service
    pub region: String,
    /// How long a received message stays hidden before it is redelivered
    pub visibility_timeout_seconds: u64,
    pub max_message_size: usize,
}

impl InMemoryConfig {
    pub fn visibility_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.visibility_timeout_seconds)
    }
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            region: "local".to_string(),
            visibility_timeout_seconds: 30,
            max_message_size: SQS_MAX_MESSAGE_SIZE,
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
