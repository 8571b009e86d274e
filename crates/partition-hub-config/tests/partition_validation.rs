//! Partition and section validation tests for partition-hub-config.
// crates/partition-hub-config/tests/partition_validation.rs
// =============================================================================
// Module: Partition Validation Tests
// Description: Validate registry entries and section range checks.
// Purpose: Ensure invalid registry entries fail startup.
// =============================================================================

use partition_hub_config::ConfigError;
use partition_hub_config::HubConfig;

type TestResult = Result<(), String>;

const PARTITION: &str = r#"
[[partitions]]
id = "west"
trust_boundary = "111122223333"
endpoint = "https://west.example.com/invoke"
credential_role = "arn:aws:iam::111122223333:role/hub"
"#;

fn assert_invalid(result: Result<HubConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

#[test]
fn minimal_partition_uses_defaults() -> TestResult {
    let config = HubConfig::from_toml_str(PARTITION).map_err(|err| err.to_string())?;
    if config.broker.session_duration_secs != 900 || config.broker.refresh_margin_secs != 60 {
        return Err("broker defaults not applied".to_string());
    }
    if config.aggregator.max_retries != 1 {
        return Err("retry default not applied".to_string());
    }
    let registry = config.build_registry().map_err(|err| err.to_string())?;
    let west = registry
        .iter()
        .next()
        .ok_or_else(|| "registry empty".to_string())?;
    if west.display_name != "west" || !west.operations.is_empty() {
        return Err("display name should default to the id".to_string());
    }
    Ok(())
}

#[test]
fn rejects_empty_registry() -> TestResult {
    assert_invalid(HubConfig::from_toml_str(""), "at least one partition")
}

#[test]
fn rejects_duplicate_partition_ids() -> TestResult {
    let toml = format!("{PARTITION}{PARTITION}");
    assert_invalid(HubConfig::from_toml_str(&toml), "duplicate partition id: west")
}

#[test]
fn rejects_http_endpoint_without_opt_in() -> TestResult {
    let toml = PARTITION.replace("https://west", "http://west");
    assert_invalid(HubConfig::from_toml_str(&toml), "without allow_http")?;
    let allowed = format!("[client]\nallow_http = true\n{toml}");
    HubConfig::from_toml_str(&allowed).map_err(|err| err.to_string())?;
    Ok(())
}

#[test]
fn rejects_unsupported_endpoint_scheme() -> TestResult {
    let toml = PARTITION.replace("https://west.example.com/invoke", "ftp://west.example.com");
    assert_invalid(HubConfig::from_toml_str(&toml), "unsupported scheme ftp")
}

#[test]
fn rejects_invalid_partition_id_characters() -> TestResult {
    let toml = PARTITION.replace("id = \"west\"", "id = \"west/../east\"");
    assert_invalid(HubConfig::from_toml_str(&toml), "invalid characters")
}

#[test]
fn rejects_blank_trust_fields() -> TestResult {
    let toml = PARTITION.replace("trust_boundary = \"111122223333\"", "trust_boundary = \" \"");
    assert_invalid(HubConfig::from_toml_str(&toml), "trust_boundary must be set")
}

#[test]
fn rejects_duplicate_operations() -> TestResult {
    let toml = format!("{PARTITION}operations = [\"a\", \"a\"]\n");
    assert_invalid(HubConfig::from_toml_str(&toml), "duplicate operation a")
}

#[test]
fn rejects_session_duration_out_of_range() -> TestResult {
    let toml = format!("[broker]\nsession_duration_secs = 60\n{PARTITION}");
    assert_invalid(HubConfig::from_toml_str(&toml), "session_duration_secs must be between")
}

#[test]
fn rejects_refresh_margin_not_below_duration() -> TestResult {
    let toml = format!("[broker]\nrefresh_margin_secs = 900\n{PARTITION}");
    assert_invalid(HubConfig::from_toml_str(&toml), "refresh_margin_secs must be less")
}

#[test]
fn rejects_retry_budget_above_one() -> TestResult {
    let toml = format!("[aggregator]\nmax_retries = 3\n{PARTITION}");
    assert_invalid(HubConfig::from_toml_str(&toml), "max_retries must be at most 1")
}

#[test]
fn rejects_file_audit_without_path() -> TestResult {
    let toml = format!("[audit]\nsink = \"file\"\n{PARTITION}");
    assert_invalid(HubConfig::from_toml_str(&toml), "audit.path is required")
}

#[test]
fn rejects_store_without_bucket() -> TestResult {
    let toml = format!("[store]\nbucket = \"\"\n{PARTITION}");
    assert_invalid(HubConfig::from_toml_str(&toml), "store.bucket must be set")
}
