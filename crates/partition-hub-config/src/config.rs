// crates/partition-hub-config/src/config.rs
// ============================================================================
// Module: Partition Hub Configuration
// Description: Configuration loading and validation for the partition hub.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: partition-hub-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: an unknown partition
//! endpoint scheme, a duplicate partition id, or an out-of-range session
//! duration stops startup instead of degrading at call time.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use partition_hub_core::OperationName;
use partition_hub_core::Partition;
use partition_hub_core::PartitionId;
use partition_hub_core::PartitionRegistry;
use partition_hub_core::TrustBoundaryId;
use partition_hub_core::TrustRef;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "partition-hub.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PARTITION_HUB_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of registered partitions.
pub(crate) const MAX_PARTITIONS: usize = 64;
/// Maximum length of a partition id.
pub(crate) const MAX_PARTITION_ID_LENGTH: usize = 64;
/// Maximum number of declared operations per partition.
pub(crate) const MAX_OPERATIONS_PER_PARTITION: usize = 64;
/// Minimum session duration accepted by the trust boundary (seconds).
pub(crate) const MIN_SESSION_DURATION_SECS: u64 = 900;
/// Maximum session duration accepted by the trust boundary (seconds).
pub(crate) const MAX_SESSION_DURATION_SECS: u64 = 43_200;
/// Default session duration (seconds).
pub(crate) const DEFAULT_SESSION_DURATION_SECS: u64 = 900;
/// Default credential refresh margin (seconds).
pub(crate) const DEFAULT_REFRESH_MARGIN_SECS: u64 = 60;
/// Default session name presented to the trust boundary.
pub(crate) const DEFAULT_SESSION_NAME: &str = "partition-hub";
/// Maximum session name length accepted by the trust boundary.
pub(crate) const MAX_SESSION_NAME_LENGTH: usize = 64;
/// Default connect timeout for partition endpoints (milliseconds).
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default response size limit (bytes).
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
/// Hard ceiling for the response size limit (bytes).
pub(crate) const MAX_RESPONSE_BYTES_CEILING: usize = 64 * 1024 * 1024;
/// Default maximum stream line length (bytes).
pub(crate) const DEFAULT_MAX_FRAME_BYTES: usize = 256 * 1024;
/// Default per-partition timeout (milliseconds).
pub(crate) const DEFAULT_PARTITION_TIMEOUT_MS: u64 = 30_000;
/// Maximum per-partition timeout (milliseconds).
pub(crate) const MAX_PARTITION_TIMEOUT_MS: u64 = 600_000;
/// Default retry budget per partition call.
pub(crate) const DEFAULT_MAX_RETRIES: u32 = 1;
/// Maximum retry budget per partition call.
pub(crate) const MAX_RETRIES_CEILING: u32 = 1;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Partition hub configuration root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    /// Credential exchange settings.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Remote tool client settings.
    #[serde(default)]
    pub client: ClientConfig,
    /// Fan-out and retry settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Optional object store used by local partition services.
    #[serde(default)]
    pub store: Option<ObjectStoreConfig>,
    /// Partition registry entries.
    #[serde(default)]
    pub partitions: Vec<PartitionConfig>,
}

impl HubConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()?;
        self.client.validate()?;
        self.aggregator.validate()?;
        self.audit.validate()?;
        if let Some(store) = &self.store {
            store.validate()?;
        }
        if self.partitions.is_empty() {
            return Err(ConfigError::Invalid("at least one partition must be configured".to_string()));
        }
        if self.partitions.len() > MAX_PARTITIONS {
            return Err(ConfigError::Invalid(format!(
                "too many partitions (max {MAX_PARTITIONS})"
            )));
        }
        let mut seen = BTreeSet::new();
        for partition in &self.partitions {
            partition.validate(self.client.allow_http)?;
            if !seen.insert(partition.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate partition id: {}",
                    partition.id
                )));
            }
        }
        Ok(())
    }

    /// Builds the immutable partition registry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the registry cannot be constructed.
    pub fn build_registry(&self) -> Result<PartitionRegistry, ConfigError> {
        let entries = self.partitions.iter().map(PartitionConfig::to_partition).collect();
        PartitionRegistry::new(entries).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

// ============================================================================
// SECTION: Broker Config
// ============================================================================

/// Credential exchange configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Optional region for the exchange service (defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional exchange endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Session name presented with every exchange.
    #[serde(default = "default_session_name")]
    pub session_name: String,
    /// Requested session duration in seconds.
    #[serde(default = "default_session_duration_secs")]
    pub session_duration_secs: u64,
    /// Remaining lifetime at or below which a cached credential is refreshed.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
    /// Cache credentials until they approach expiry.
    #[serde(default = "default_cache_credentials")]
    pub cache_credentials: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            session_name: default_session_name(),
            session_duration_secs: default_session_duration_secs(),
            refresh_margin_secs: default_refresh_margin_secs(),
            cache_credentials: default_cache_credentials(),
        }
    }
}

impl BrokerConfig {
    /// Returns the requested session duration.
    #[must_use]
    pub const fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_secs)
    }

    /// Returns the cache refresh margin.
    #[must_use]
    pub const fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    /// Validates broker configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let name = self.session_name.as_str();
        if name.len() < 2 || name.len() > MAX_SESSION_NAME_LENGTH {
            return Err(ConfigError::Invalid(
                "broker.session_name must be 2-64 characters".to_string(),
            ));
        }
        if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || "+=,.@_-".contains(ch)) {
            return Err(ConfigError::Invalid(
                "broker.session_name contains invalid characters".to_string(),
            ));
        }
        if !(MIN_SESSION_DURATION_SECS ..= MAX_SESSION_DURATION_SECS)
            .contains(&self.session_duration_secs)
        {
            return Err(ConfigError::Invalid(format!(
                "broker.session_duration_secs must be between {MIN_SESSION_DURATION_SECS} and \
                 {MAX_SESSION_DURATION_SECS}"
            )));
        }
        if self.refresh_margin_secs >= self.session_duration_secs {
            return Err(ConfigError::Invalid(
                "broker.refresh_margin_secs must be less than session_duration_secs".to_string(),
            ));
        }
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(ConfigError::Invalid("broker.region must be non-empty".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint("broker.endpoint", endpoint, false)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Client Config
// ============================================================================

/// Remote tool client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum bytes read from one partition response.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Maximum length of one event-stream line.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Allow non-TLS partition endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
    /// User agent presented to partition endpoints.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            max_frame_bytes: default_max_frame_bytes(),
            allow_http: false,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Validates client configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "client.connect_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES_CEILING {
            return Err(ConfigError::Invalid(format!(
                "client.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES_CEILING}"
            )));
        }
        if self.max_frame_bytes == 0 || self.max_frame_bytes > self.max_response_bytes {
            return Err(ConfigError::Invalid(
                "client.max_frame_bytes must be between 1 and max_response_bytes".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("client.user_agent must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Aggregator Config
// ============================================================================

/// Fan-out configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Per-attempt timeout covering credential acquisition and the call.
    #[serde(default = "default_partition_timeout_ms")]
    pub partition_timeout_ms: u64,
    /// Retries allowed per partition call for retryable failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            partition_timeout_ms: default_partition_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

impl AggregatorConfig {
    /// Returns the per-attempt timeout.
    #[must_use]
    pub const fn partition_timeout(&self) -> Duration {
        Duration::from_millis(self.partition_timeout_ms)
    }

    /// Validates aggregator configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.partition_timeout_ms == 0 || self.partition_timeout_ms > MAX_PARTITION_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "aggregator.partition_timeout_ms must be between 1 and {MAX_PARTITION_TIMEOUT_MS}"
            )));
        }
        if self.max_retries > MAX_RETRIES_CEILING {
            return Err(ConfigError::Invalid(format!(
                "aggregator.max_retries must be at most {MAX_RETRIES_CEILING}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Audit Config
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard audit events.
    None,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path (required for the file sink).
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid with the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Object Store Config
// ============================================================================

/// Object-store configuration for partition datasets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStoreConfig {
    /// Bucket holding partition datasets.
    pub bucket: String,
    /// Optional region (defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional object-store endpoint (S3-compatible).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Force path-style addressing (S3-compatible).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
}

impl ObjectStoreConfig {
    /// Validates object-store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when object-store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid("store.bucket must be set".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint("store.endpoint", endpoint, self.allow_http)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Partition Config
// ============================================================================

/// One partition registry entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionConfig {
    /// Partition identifier.
    pub id: String,
    /// Display name (defaults to the id).
    #[serde(default)]
    pub display_name: Option<String>,
    /// Trust boundary identifier (for example the account id).
    pub trust_boundary: String,
    /// Partition tool endpoint.
    pub endpoint: String,
    /// Credential role reference.
    pub credential_role: String,
    /// Operations the partition exposes.
    #[serde(default)]
    pub operations: Vec<String>,
}

impl PartitionConfig {
    /// Validates one partition entry.
    fn validate(&self, allow_http: bool) -> Result<(), ConfigError> {
        let id = self.id.as_str();
        if id.is_empty() || id.len() > MAX_PARTITION_ID_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "partition id must be 1-{MAX_PARTITION_ID_LENGTH} characters"
            )));
        }
        if !id.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
            return Err(ConfigError::Invalid(format!("partition id contains invalid characters: {id}")));
        }
        if self.trust_boundary.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("partition {id}: trust_boundary must be set")));
        }
        if self.credential_role.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("partition {id}: credential_role must be set")));
        }
        validate_endpoint(&format!("partition {id}: endpoint"), &self.endpoint, allow_http)?;
        if self.operations.len() > MAX_OPERATIONS_PER_PARTITION {
            return Err(ConfigError::Invalid(format!("partition {id}: too many operations")));
        }
        let mut seen = BTreeSet::new();
        for operation in &self.operations {
            if operation.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "partition {id}: operation names must be non-empty"
                )));
            }
            if !seen.insert(operation.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "partition {id}: duplicate operation {operation}"
                )));
            }
        }
        Ok(())
    }

    /// Converts the entry into a registry partition.
    fn to_partition(&self) -> Partition {
        Partition {
            id: PartitionId::new(self.id.clone()),
            display_name: self.display_name.clone().unwrap_or_else(|| self.id.clone()),
            trust_boundary: TrustBoundaryId::new(self.trust_boundary.trim()),
            endpoint: self.endpoint.trim().to_string(),
            credential_role: TrustRef::new(self.credential_role.trim()),
            operations: self.operations.iter().map(|name| OperationName::new(name.trim())).collect(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI input or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an endpoint URL and its scheme.
fn validate_endpoint(field: &str, value: &str, allow_http: bool) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(ConfigError::Invalid(format!("{field} uses http:// without allow_http")));
        }
        other => {
            return Err(ConfigError::Invalid(format!("{field} has unsupported scheme {other}")));
        }
    }
    if url.host_str().is_none() {
        return Err(ConfigError::Invalid(format!("{field} must include a host")));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(format!("{field} must not embed credentials")));
    }
    Ok(())
}

/// Default session name.
fn default_session_name() -> String {
    DEFAULT_SESSION_NAME.to_string()
}

/// Default session duration.
const fn default_session_duration_secs() -> u64 {
    DEFAULT_SESSION_DURATION_SECS
}

/// Default refresh margin.
const fn default_refresh_margin_secs() -> u64 {
    DEFAULT_REFRESH_MARGIN_SECS
}

/// Default credential caching.
const fn default_cache_credentials() -> bool {
    true
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default response limit.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Default stream line limit.
const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

/// Default user agent.
fn default_user_agent() -> String {
    format!("partition-hub/{}", env!("CARGO_PKG_VERSION"))
}

/// Default per-partition timeout.
const fn default_partition_timeout_ms() -> u64 {
    DEFAULT_PARTITION_TIMEOUT_MS
}

/// Default retry budget.
const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
