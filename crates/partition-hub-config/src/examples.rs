// crates/partition-hub-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for operators and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `partition-hub.toml`. The example is validated by the
//! crate's tests so it cannot drift from the model.

/// Returns a canonical example `partition-hub.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[broker]
region = "us-east-1"
session_name = "partition-hub"
session_duration_secs = 900
refresh_margin_secs = 60
cache_credentials = true

[client]
connect_timeout_ms = 5000
max_response_bytes = 4194304
max_frame_bytes = 262144
allow_http = false

[aggregator]
partition_timeout_ms = 30000
max_retries = 1

[audit]
sink = "stderr"

[store]
bucket = "partition-hub-datasets"
# endpoint = "https://s3.example.com"
# force_path_style = false
# allow_http = false

[[partitions]]
id = "corporate_banking"
display_name = "Corporate Banking"
trust_boundary = "891377397197"
endpoint = "https://corporate-banking.example.com/invocations"
credential_role = "arn:aws:iam::891377397197:role/partition-hub-access"
operations = ["query_customer_loans", "get_bank_aggregate_data", "get_industry_exposure"]

[[partitions]]
id = "treasury_risk"
display_name = "Treasury & Risk"
trust_boundary = "058264155998"
endpoint = "https://treasury-risk.example.com/invocations"
credential_role = "arn:aws:iam::058264155998:role/partition-hub-access"
operations = ["query_risk_models", "get_market_data", "calculate_expected_loss"]
"#,
    )
}
