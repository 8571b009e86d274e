// crates/partition-hub-client/src/client.rs
// ============================================================================
// Module: Remote Tool Client
// Description: Authenticated HTTP tool invocation with bounded and streamed bodies.
// Purpose: Turn one partition call into one ToolResult or a classified failure.
// Dependencies: partition-hub-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! One call is: refuse unusable credentials, POST the request with the
//! credential's headers, then read either a bounded JSON document or an
//! event stream. The whole call runs under one `tokio` deadline; when it
//! fires the in-flight future is dropped together with any partial buffer.
//! The client never retries.
//!
//! Security posture: partition responses are untrusted; every read is bounded
//! and access material never leaves the request headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use partition_hub_config::ClientConfig;
use partition_hub_core::AuditSink;
use partition_hub_core::Clock;
use partition_hub_core::HubAuditEvent;
use partition_hub_core::HubAuditEventParams;
use partition_hub_core::InvokeError;
use partition_hub_core::NoopAuditSink;
use partition_hub_core::Partition;
use partition_hub_core::PartitionId;
use partition_hub_core::PartitionResponse;
use partition_hub_core::ScopedCredential;
use partition_hub_core::SystemClock;
use partition_hub_core::ToolInvoker;
use partition_hub_core::ToolRequest;
use partition_hub_core::ToolResult;
use partition_hub_core::audit::EVENT_STREAM_FRAME_SKIPPED;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::ACCEPT;
use reqwest::header::AUTHORIZATION;
use reqwest::header::CONTENT_TYPE;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;

use crate::stream::FrameDecoder;
use crate::stream::StreamAssembler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the access key id of the scoped credential.
pub const ACCESS_KEY_HEADER: &str = "x-partition-access-key-id";
/// Header carrying the target partition id.
pub const PARTITION_HEADER: &str = "x-partition-id";
/// Maximum bytes of a rejected response body kept for diagnostics.
pub const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;
/// Content type announcing an event stream.
const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Remote client limits and transport options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// Maximum bytes read from one response.
    pub max_response_bytes: usize,
    /// Maximum length of one stream line.
    pub max_frame_bytes: usize,
    /// Allow plain HTTP endpoints.
    pub allow_http: bool,
    /// User agent header.
    pub user_agent: String,
}

impl From<&ClientConfig> for ClientSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            max_response_bytes: config.max_response_bytes,
            max_frame_bytes: config.max_frame_bytes,
            allow_http: config.allow_http,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// Client construction failures.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The HTTP client could not be built.
    #[error("remote client build error: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// HTTP tool invoker for partition endpoints.
pub struct RemoteToolClient {
    /// Shared HTTP client.
    client: Client,
    /// Limits.
    settings: ClientSettings,
    /// Time source for credential checks.
    clock: Arc<dyn Clock>,
    /// Audit sink for skipped frames.
    audit: Arc<dyn AuditSink>,
}

impl fmt::Debug for RemoteToolClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteToolClient").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl RemoteToolClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError`] when the HTTP client cannot be constructed.
    pub fn new(settings: ClientSettings) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .redirect(Policy::none())
            .https_only(!settings.allow_http)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| ClientBuildError::Build(err.to_string()))?;
        Ok(Self {
            client,
            settings,
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Refuses credentials that are expired or scoped to another partition.
    fn check_credential(
        &self,
        partition: &Partition,
        credential: &ScopedCredential,
    ) -> Result<(), InvokeError> {
        if credential.partition_id != partition.id {
            return Err(InvokeError::CredentialDenied(format!(
                "credential is scoped to {}, not {}",
                credential.partition_id, partition.id
            )));
        }
        if credential.is_expired_at(self.clock.now()) {
            return Err(InvokeError::CredentialDenied(format!(
                "credential for {} expired at {}",
                partition.id,
                credential.expires_at.as_unix_millis()
            )));
        }
        Ok(())
    }

    /// Runs the call. The caller enforces `timeout`; transport timeouts
    /// surfacing from reqwest are reported against the same budget.
    async fn call(
        &self,
        partition: &Partition,
        credential: &ScopedCredential,
        request: &ToolRequest,
        timeout: Duration,
    ) -> Result<ToolResult, InvokeError> {
        let payload = serde_json::to_vec(request).map_err(|err| {
            InvokeError::MalformedResponse(format!("request serialization failed: {err}"))
        })?;
        let response = self
            .client
            .post(&partition.endpoint)
            .headers(request_headers(partition, credential)?)
            .body(payload)
            .send()
            .await
            .map_err(|err| map_send_error(&err, timeout))?;
        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(InvokeError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }
        if is_event_stream(&response) {
            self.read_stream(partition, response, timeout).await
        } else {
            let limit = self.settings.max_response_bytes;
            let body = read_response_body_with_limit(response, limit, timeout).await?;
            if body.is_empty() {
                return Err(InvokeError::EmptyResponse);
            }
            let value: Value = serde_json::from_slice(&body).map_err(|err| {
                InvokeError::MalformedResponse(format!("response is not json: {err}"))
            })?;
            Ok(interpret_payload(partition.id.clone(), value))
        }
    }

    /// Consumes an event stream into one result.
    async fn read_stream(
        &self,
        partition: &Partition,
        mut response: Response,
        timeout: Duration,
    ) -> Result<ToolResult, InvokeError> {
        let mut decoder = FrameDecoder::new(self.settings.max_frame_bytes);
        let mut assembler = StreamAssembler::new();
        let mut received: usize = 0;
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) if err.is_timeout() => {
                    return Err(InvokeError::Timeout(duration_millis(timeout)));
                }
                Err(err) => {
                    self.record_skip(&partition.id, format!("stream read failed: {err}"));
                    break;
                }
            };
            received = received.saturating_add(chunk.len());
            if received > self.settings.max_response_bytes {
                self.record_skip(&partition.id, "stream exceeds size limit".to_string());
                break;
            }
            for frame in decoder.push(&chunk) {
                if let Some(reason) = assembler.apply(frame) {
                    self.record_skip(&partition.id, reason);
                }
            }
            if assembler.is_complete() {
                break;
            }
        }
        if !assembler.is_complete() {
            for frame in decoder.finish() {
                if let Some(reason) = assembler.apply(frame) {
                    self.record_skip(&partition.id, reason);
                }
            }
        }
        if received == 0 {
            return Err(InvokeError::EmptyResponse);
        }
        let outcome = assembler.finish();
        let value = serde_json::from_str::<Value>(&outcome.text)
            .unwrap_or_else(|_| Value::String(outcome.text.clone()));
        let mut result = interpret_payload(partition.id.clone(), value);
        result.incomplete_stream = !outcome.complete;
        Ok(result)
    }

    /// Records a skipped stream frame.
    fn record_skip(&self, partition_id: &PartitionId, reason: String) {
        self.audit.record(&HubAuditEvent::new(
            EVENT_STREAM_FRAME_SKIPPED,
            HubAuditEventParams {
                partition_id: Some(partition_id.clone()),
                detail: Some(reason),
                ..HubAuditEventParams::default()
            },
        ));
    }
}

#[async_trait]
impl ToolInvoker for RemoteToolClient {
    async fn invoke(
        &self,
        partition: &Partition,
        credential: &ScopedCredential,
        request: &ToolRequest,
        timeout: Duration,
    ) -> Result<ToolResult, InvokeError> {
        self.check_credential(partition, credential)?;
        tokio::time::timeout(timeout, self.call(partition, credential, request, timeout))
            .await
            .map_err(|_| InvokeError::Timeout(duration_millis(timeout)))?
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds request headers from the scoped credential.
fn request_headers(
    partition: &Partition,
    credential: &ScopedCredential,
) -> Result<HeaderMap, InvokeError> {
    let invalid = |what: &str| InvokeError::CredentialDenied(format!("{what} is not a valid header"));
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/event-stream"));
    let bearer = format!("Bearer {}", credential.material.session_token);
    let mut bearer = HeaderValue::from_str(&bearer).map_err(|_| invalid("session token"))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(
        ACCESS_KEY_HEADER,
        HeaderValue::from_str(&credential.material.access_key_id)
            .map_err(|_| invalid("access key id"))?,
    );
    headers.insert(
        PARTITION_HEADER,
        HeaderValue::from_str(partition.id.as_str()).map_err(|_| invalid("partition id"))?,
    );
    Ok(headers)
}

/// Maps a send failure to an invoke error.
fn map_send_error(err: &reqwest::Error, timeout: Duration) -> InvokeError {
    if err.is_timeout() {
        InvokeError::Timeout(duration_millis(timeout))
    } else {
        InvokeError::EndpointUnavailable(err.to_string())
    }
}

/// Returns true when the response announces an event stream.
fn is_event_stream(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value.trim().to_ascii_lowercase().starts_with(EVENT_STREAM_CONTENT_TYPE)
        })
}

/// Unwraps a partition envelope or takes the value as the success payload.
fn interpret_payload(partition_id: PartitionId, value: Value) -> ToolResult {
    match PartitionResponse::from_value(&value) {
        Some(envelope) => envelope.into_result(partition_id),
        None => ToolResult::succeeded(partition_id, value),
    }
}

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: Response,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<u8>, InvokeError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|err| map_send_error(&err, timeout))? {
        let next_total = body.len().saturating_add(chunk.len());
        if next_total > limit {
            return Err(InvokeError::MalformedResponse(format!(
                "response exceeds size limit ({next_total} > {limit})"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Reads at most [`MAX_ERROR_BODY_BYTES`] of a rejected response, lossily.
async fn read_error_body(mut response: Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    body.truncate(MAX_ERROR_BODY_BYTES);
    String::from_utf8_lossy(&body).trim().to_string()
}

/// Converts a duration to whole milliseconds.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
