// crates/partition-hub-broker/src/sts.rs
// ============================================================================
// Module: STS Trust Boundary
// Description: AssumeRole-backed credential exchange.
// Purpose: Production trust boundary for cross-account partitions.
// Dependencies: aws-config, aws-sdk-sts, partition-hub-config
// ============================================================================

//! ## Overview
//! [`StsTrustBoundary`] calls `AssumeRole` with the hub's ambient identity
//! (resolved by the default AWS provider chain). Service errors are split
//! into throttling (unavailable) and everything else (denied); transport
//! failures are always unavailable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::DisplayErrorContext;
use aws_sdk_sts::error::ProvideErrorMetadata;
use aws_sdk_sts::error::SdkError;
use aws_sdk_sts::operation::assume_role::AssumeRoleError;
use partition_hub_config::BrokerConfig;
use partition_hub_core::AccessMaterial;
use partition_hub_core::Timestamp;

use crate::trust::ExchangeError;
use crate::trust::ExchangeGrant;
use crate::trust::ExchangeRequest;
use crate::trust::TrustBoundary;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Service error codes that indicate a transient condition.
const TRANSIENT_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "InternalFailure",
    "RegionDisabledException",
];

// ============================================================================
// SECTION: Trust Boundary
// ============================================================================

/// AssumeRole trust boundary.
#[derive(Debug, Clone)]
pub struct StsTrustBoundary {
    /// STS client bound to the hub identity.
    client: Client,
}

impl StsTrustBoundary {
    /// Builds a trust boundary from broker configuration.
    pub async fn from_config(config: &BrokerConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared_config = loader.load().await;
        Self {
            client: Client::new(&shared_config),
        }
    }

    /// Wraps an existing STS client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl TrustBoundary for StsTrustBoundary {
    async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeGrant, ExchangeError> {
        let duration_seconds = i32::try_from(request.duration.as_secs())
            .map_err(|_| ExchangeError::Denied("session duration out of range".to_string()))?;
        let output = self
            .client
            .assume_role()
            .role_arn(request.role.as_str())
            .role_session_name(request.session_name.as_str())
            .duration_seconds(duration_seconds)
            .send()
            .await
            .map_err(classify_sdk_error)?;
        let credentials = output
            .credentials()
            .ok_or_else(|| ExchangeError::Denied("exchange returned no credentials".to_string()))?;
        let expires_at = credentials
            .expiration()
            .to_millis()
            .map(Timestamp::from_unix_millis)
            .map_err(|err| ExchangeError::Denied(format!("unreadable expiry: {err}")))?;
        Ok(ExchangeGrant {
            material: AccessMaterial {
                access_key_id: credentials.access_key_id().to_string(),
                secret_access_key: credentials.secret_access_key().to_string(),
                session_token: credentials.session_token().to_string(),
            },
            expires_at,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps an AssumeRole SDK error into an exchange failure.
fn classify_sdk_error(error: SdkError<AssumeRoleError>) -> ExchangeError {
    match &error {
        SdkError::ServiceError(context) => {
            let service_error = context.err();
            let code = service_error.code().unwrap_or("Unknown");
            let message = service_error.message().unwrap_or("no message");
            classify_service_code(code, message)
        }
        _ => ExchangeError::Unavailable(DisplayErrorContext(&error).to_string()),
    }
}

/// Classifies a service error code.
pub(crate) fn classify_service_code(code: &str, message: &str) -> ExchangeError {
    if TRANSIENT_ERROR_CODES.contains(&code) {
        ExchangeError::Unavailable(format!("{code}: {message}"))
    } else {
        ExchangeError::Denied(format!("{code}: {message}"))
    }
}
