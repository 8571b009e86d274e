// crates/partition-hub-client/tests/remote_client.rs
// ============================================================================
// Module: Remote Tool Client Tests
// Description: End-to-end calls against a scripted loopback HTTP server.
// Purpose: Pin response interpretation and failure classification.
// Dependencies: partition-hub-client, partition-hub-core, tokio
// ============================================================================
//! ## Overview
//! Each test binds a one-shot HTTP/1.1 server on loopback that reads the
//! request and replies with scripted bytes, optionally split into delayed
//! writes to simulate a streamed body.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use partition_hub_client::ClientSettings;
use partition_hub_client::RemoteToolClient;
use partition_hub_core::AccessMaterial;
use partition_hub_core::ErrorKind;
use partition_hub_core::InvokeError;
use partition_hub_core::ManualClock;
use partition_hub_core::MemoryAuditSink;
use partition_hub_core::OperationName;
use partition_hub_core::Partition;
use partition_hub_core::PartitionId;
use partition_hub_core::ScopedCredential;
use partition_hub_core::Timestamp;
use partition_hub_core::ToolInvoker;
use partition_hub_core::ToolRequest;
use partition_hub_core::TrustBoundaryId;
use partition_hub_core::TrustRef;
use partition_hub_core::audit::EVENT_STREAM_FRAME_SKIPPED;
use serde_json::Map;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const NOW_MS: i64 = 1_700_000_000_000;
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Scripted reply: response head plus body pieces written with a pause between.
struct Reply {
    head: String,
    pieces: Vec<Vec<u8>>,
    pause: Duration,
}

impl Reply {
    fn json(status: &str, body: &str) -> Self {
        Self {
            head: format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\
                 connection: close\r\n\r\n",
                body.len()
            ),
            pieces: vec![body.as_bytes().to_vec()],
            pause: Duration::ZERO,
        }
    }

    fn stream(pieces: Vec<String>) -> Self {
        Self {
            head: "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n"
                .to_string(),
            pieces: pieces.into_iter().map(String::into_bytes).collect(),
            pause: Duration::from_millis(10),
        }
    }
}

/// Starts a one-shot server and returns its address plus the captured request.
async fn serve_once(reply: Reply) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (sender, receiver) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let _ = sender.send(request);
        socket.write_all(reply.head.as_bytes()).await.unwrap();
        for piece in reply.pieces {
            if socket.write_all(&piece).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
            tokio::time::sleep(reply.pause).await;
        }
        let _ = socket.shutdown().await;
    });
    (addr, receiver)
}

/// Reads one request (head plus content-length body) as lossy text.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let read = socket.read(&mut chunk).await.unwrap();
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[.. read]);
        let text = String::from_utf8_lossy(&buffer).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[.. head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= head_end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).to_string()
}

fn partition(addr: SocketAddr) -> Partition {
    Partition {
        id: PartitionId::new("corporate_banking"),
        display_name: "Corporate Banking".to_string(),
        trust_boundary: TrustBoundaryId::new("891377397197"),
        endpoint: format!("http://{addr}/invocations"),
        credential_role: TrustRef::new("arn:aws:iam::891377397197:role/hub"),
        operations: BTreeSet::new(),
    }
}

fn credential(partition_id: &str, expires_in: Duration) -> ScopedCredential {
    ScopedCredential {
        partition_id: PartitionId::new(partition_id),
        material: AccessMaterial {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret-key".to_string(),
            session_token: "session-token".to_string(),
        },
        issued_at: Timestamp::from_unix_millis(NOW_MS),
        expires_at: Timestamp::from_unix_millis(NOW_MS).saturating_add(expires_in),
    }
}

fn client(audit: Arc<MemoryAuditSink>) -> RemoteToolClient {
    let settings = ClientSettings {
        allow_http: true,
        max_frame_bytes: 1024,
        max_response_bytes: 64 * 1024,
        ..ClientSettings::default()
    };
    RemoteToolClient::new(settings)
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(Timestamp::from_unix_millis(NOW_MS))))
        .with_audit(audit)
}

fn request() -> ToolRequest {
    let mut arguments = Map::new();
    arguments.insert("bank_name".to_string(), json!("Chase"));
    ToolRequest::explicit(OperationName::new("query_customer_loans"), arguments)
}

fn delta(text: &str) -> String {
    format!("data: {}\n\n", json!({"event": {"contentBlockDelta": {"delta": {"text": text}}}}))
}

// ============================================================================
// SECTION: JSON Responses
// ============================================================================

#[tokio::test]
async fn envelope_success_is_unwrapped_and_headers_are_sent() {
    let body = json!({"success": true, "payload": {"total_results": 2}}).to_string();
    let (addr, captured) = serve_once(Reply::json("200 OK", &body)).await;
    let target = partition(addr);
    let result = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.payload, Some(json!({"total_results": 2})));
    assert!(!result.incomplete_stream);

    let request_text = captured.await.unwrap().to_ascii_lowercase();
    assert!(request_text.starts_with("post /invocations"));
    assert!(request_text.contains("authorization: bearer session-token"));
    assert!(request_text.contains("x-partition-access-key-id: asiaexample"));
    assert!(request_text.contains("x-partition-id: corporate_banking"));
    assert!(request_text.contains("\"operation\":\"query_customer_loans\""));
    assert!(!request_text.contains("secret-key"));
}

#[tokio::test]
async fn envelope_failure_keeps_partition_error() {
    let body = json!({
        "success": false,
        "error": {"kind": "invalid_argument", "message": "bad amount", "key": "min_amount"}
    })
    .to_string();
    let (addr, _captured) = serve_once(Reply::json("200 OK", &body)).await;
    let target = partition(addr);
    let result = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap();
    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::InvalidArgument);
    assert_eq!(error.key.as_deref(), Some("min_amount"));
}

#[tokio::test]
async fn bare_json_is_taken_as_payload() {
    let body = json!({"market_data": {"fed_funds_rate": 5.33}, "note": "sample"}).to_string();
    let (addr, _captured) = serve_once(Reply::json("200 OK", &body)).await;
    let target = partition(addr);
    let result = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.payload.unwrap()["note"], json!("sample"));
}

#[tokio::test]
async fn empty_body_is_empty_response() {
    let (addr, _captured) = serve_once(Reply::json("200 OK", "")).await;
    let target = partition(addr);
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, InvokeError::EmptyResponse);
}

#[tokio::test]
async fn unparseable_body_is_malformed() {
    let (addr, _captured) = serve_once(Reply::json("200 OK", "{not json")).await;
    let target = partition(addr);
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn non_success_status_is_remote_rejected_with_body() {
    let (addr, _captured) = serve_once(Reply::json("403 Forbidden", "access denied")).await;
    let target = partition(addr);
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        InvokeError::RemoteRejected {
            status: 403,
            body: "access denied".to_string(),
        }
    );
}

// ============================================================================
// SECTION: Streamed Responses
// ============================================================================

#[tokio::test]
async fn streamed_deltas_are_reassembled_across_writes() {
    let full = format!(
        "{}{}{}data: {}\n\n",
        delta("{\"total_results\":"),
        delta(" 3, \"lob\": "),
        delta("\"corporate\"}"),
        json!({"event": {"messageStop": {"stopReason": "end_turn"}}})
    );
    let bytes = full.as_bytes();
    let pieces: Vec<String> =
        bytes.chunks(9).map(|piece| String::from_utf8_lossy(piece).to_string()).collect();
    let (addr, _captured) = serve_once(Reply::stream(pieces)).await;
    let target = partition(addr);
    let result = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap();
    assert!(result.success);
    assert!(!result.incomplete_stream);
    assert_eq!(result.payload, Some(json!({"total_results": 3, "lob": "corporate"})));
}

#[tokio::test]
async fn stream_without_stop_is_marked_incomplete() {
    let pieces = vec![delta("partial "), delta("answer")];
    let (addr, _captured) = serve_once(Reply::stream(pieces)).await;
    let target = partition(addr);
    let result = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap();
    assert!(result.success);
    assert!(result.incomplete_stream);
    assert_eq!(result.payload, Some(json!("partial answer")));
}

#[tokio::test]
async fn malformed_frames_are_skipped_and_audited() {
    let pieces = vec![
        delta("kept"),
        "data: {broken\n\n".to_string(),
        "data: [DONE]\n\n".to_string(),
    ];
    let (addr, _captured) = serve_once(Reply::stream(pieces)).await;
    let target = partition(addr);
    let audit = Arc::new(MemoryAuditSink::default());
    let result = client(Arc::clone(&audit))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(result.payload, Some(json!("kept")));
    assert!(!result.incomplete_stream);
    let skipped = audit.events_named(EVENT_STREAM_FRAME_SKIPPED);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].partition_id, Some(PartitionId::new("corporate_banking")));
}

// ============================================================================
// SECTION: Failures Before And During Transport
// ============================================================================

#[tokio::test]
async fn slow_partition_times_out() {
    let reply = Reply {
        head: String::new(),
        pieces: vec![Vec::new()],
        pause: Duration::from_secs(5),
    };
    let (addr, _captured) = serve_once(reply).await;
    let target = partition(addr);
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(
            &target,
            &credential("corporate_banking", Duration::from_secs(900)),
            &request(),
            Duration::from_millis(200),
        )
        .await
        .unwrap_err();
    assert_eq!(err, InvokeError::Timeout(200));
}

#[tokio::test]
async fn stalled_stream_times_out_without_partial_result() {
    let mut reply = Reply::stream(vec![delta("partial "), delta("answer")]);
    reply.pause = Duration::from_secs(5);
    let (addr, _captured) = serve_once(reply).await;
    let target = partition(addr);
    let outcome = client(Arc::new(MemoryAuditSink::default()))
        .invoke(
            &target,
            &credential("corporate_banking", Duration::from_secs(900)),
            &request(),
            Duration::from_millis(300),
        )
        .await;
    match outcome {
        Err(err) => {
            assert_eq!(err, InvokeError::Timeout(300));
            assert!(err.to_string().contains("300"));
        }
        Ok(result) => panic!("expected timeout, got payload {:?}", result.payload),
    }
}

#[tokio::test]
async fn expired_credential_is_refused_before_send() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = partition(listener.local_addr().unwrap());
    let expired = ScopedCredential {
        expires_at: Timestamp::from_unix_millis(NOW_MS),
        ..credential("corporate_banking", Duration::ZERO)
    };
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &expired, &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialDenied);
    let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "no connection may be attempted");
}

#[tokio::test]
async fn credential_for_another_partition_is_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = partition(listener.local_addr().unwrap());
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("treasury_risk", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::CredentialDenied(message) if message.contains("treasury_risk")));
}

#[tokio::test]
async fn refused_connection_is_endpoint_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let target = partition(addr);
    let err = client(Arc::new(MemoryAuditSink::default()))
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndpointUnavailable);
}

#[tokio::test]
async fn http_endpoint_is_refused_without_allow_http() {
    let (addr, _captured) = serve_once(Reply::json("200 OK", "{}")).await;
    let target = partition(addr);
    let strict = RemoteToolClient::new(ClientSettings::default())
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(Timestamp::from_unix_millis(NOW_MS))));
    let err = strict
        .invoke(&target, &credential("corporate_banking", Duration::from_secs(900)), &request(), CALL_TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EndpointUnavailable);
}
