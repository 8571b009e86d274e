// crates/partition-hub-cli/src/main.rs
// ============================================================================
// Module: Partition Hub CLI Entry Point
// Description: Command dispatcher for cross-partition queries and local services.
// Purpose: Run hub requests from a config file and exercise partition services offline.
// Dependencies: clap, partition-hub-*, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The `partition-hub` binary wires the configured registry, credential
//! broker, remote tool client, and aggregator into a [`Hub`] and prints the
//! composite response as JSON. `dispatch` runs one partition service locally
//! against a dataset file or the configured object store. Inputs are
//! untrusted: files are read with hard size limits and argument bags must be
//! JSON objects.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use partition_hub_broker::BrokerSettings;
use partition_hub_broker::CachingCredentialBroker;
use partition_hub_broker::RegistryCredentialBroker;
use partition_hub_broker::StsTrustBoundary;
use partition_hub_client::ClientSettings;
use partition_hub_client::RemoteToolClient;
use partition_hub_config::AuditConfig;
use partition_hub_config::AuditSinkKind;
use partition_hub_config::HubConfig;
use partition_hub_config::config_toml_example;
use partition_hub_core::ArgumentBag;
use partition_hub_core::AuditSink;
use partition_hub_core::CredentialBroker;
use partition_hub_core::FileAuditSink;
use partition_hub_core::NoopAuditSink;
use partition_hub_core::OperationName;
use partition_hub_core::PartitionId;
use partition_hub_core::StderrAuditSink;
use partition_hub_core::ToolRequest;
use partition_hub_dispatch::AmbiguousDispatcher;
use partition_hub_dispatch::CORPORATE_DATASET_KEY;
use partition_hub_dispatch::CorporateBankingService;
use partition_hub_dispatch::DatasetLocation;
use partition_hub_dispatch::InMemoryObjectStore;
use partition_hub_dispatch::MAX_OBJECT_BYTES;
use partition_hub_dispatch::ObjectStore;
use partition_hub_dispatch::PartitionService;
use partition_hub_dispatch::S3ObjectStore;
use partition_hub_dispatch::TREASURY_DATASET_KEY;
use partition_hub_dispatch::TreasuryRiskService;
use partition_hub_orchestrator::Aggregator;
use partition_hub_orchestrator::AggregatorSettings;
use partition_hub_orchestrator::Hub;
use partition_hub_orchestrator::HubRequest;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a hub request file.
const MAX_REQUEST_BYTES: usize = 1024 * 1024;
/// Maximum size of an inline `--arguments` value.
const MAX_ARGUMENTS_BYTES: usize = 64 * 1024;
/// Bucket name used for datasets loaded from local files.
const LOCAL_BUCKET: &str = "local";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Partition hub command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "partition-hub",
    about = "Cross-partition query orchestration",
    disable_help_subcommand = true,
    disable_version_flag = true
)]
struct Cli {
    /// Print the version and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Fan one request out to partitions and print the composite response.
    Aggregate(AggregateCommand),
    /// Issue one request to partitions and tag the result with a metric.
    Compare(CompareCommand),
    /// Run a partition service locally against its dataset.
    Dispatch(DispatchCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Request arguments shared by hub commands.
#[derive(Args, Debug, Clone, Default)]
struct HubArgs {
    /// Path to `partition-hub.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Partition to address (repeatable); all partitions when omitted.
    #[arg(long = "partition", value_name = "ID")]
    partitions: Vec<String>,
    /// Operation to run; partitions infer it when omitted.
    #[arg(long, value_name = "NAME")]
    operation: Option<String>,
    /// Argument bag as a JSON object.
    #[arg(long, value_name = "JSON")]
    arguments: Option<String>,
    /// Query text echoed in the response metadata.
    #[arg(long, value_name = "TEXT")]
    query: Option<String>,
    /// Read the full hub request from a JSON file.
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["partitions", "operation", "arguments", "query"]
    )]
    request: Option<PathBuf>,
}

/// Arguments for `aggregate`.
#[derive(Args, Debug)]
struct AggregateCommand {
    /// Shared request arguments.
    #[command(flatten)]
    hub: HubArgs,
}

/// Arguments for `compare`.
#[derive(Args, Debug)]
struct CompareCommand {
    /// Shared request arguments.
    #[command(flatten)]
    hub: HubArgs,
    /// Metric label attached to the comparison.
    #[arg(long, value_name = "METRIC")]
    metric: String,
}

/// Partition services runnable with `dispatch`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceArg {
    /// Corporate banking loans and exposure.
    Corporate,
    /// Treasury risk models and market data.
    Treasury,
}

impl ServiceArg {
    /// Returns the default dataset key for the service.
    const fn dataset_key(self) -> &'static str {
        match self {
            Self::Corporate => CORPORATE_DATASET_KEY,
            Self::Treasury => TREASURY_DATASET_KEY,
        }
    }
}

/// Arguments for `dispatch`.
#[derive(Args, Debug)]
struct DispatchCommand {
    /// Service to run.
    #[arg(long, value_enum)]
    service: ServiceArg,
    /// Local dataset file; the configured object store is used when omitted.
    #[arg(long, value_name = "PATH")]
    dataset: Option<PathBuf>,
    /// Path to `partition-hub.toml` (object store mode).
    #[arg(long, value_name = "PATH", conflicts_with = "dataset")]
    config: Option<PathBuf>,
    /// Object key override (object store mode).
    #[arg(long, value_name = "KEY", conflicts_with = "dataset")]
    key: Option<String>,
    /// Operation to run; inferred from the arguments when omitted.
    #[arg(long, value_name = "NAME")]
    operation: Option<String>,
    /// Argument bag as a JSON object.
    #[arg(long, value_name = "JSON")]
    arguments: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example configuration.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Path to `partition-hub.toml`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("partition-hub {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Aggregate(command) => command_aggregate(&command).await,
        Commands::Compare(command) => command_compare(&command).await,
        Commands::Dispatch(command) => command_dispatch(&command).await,
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help().to_string();
    write_stdout_line(&help).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Hub Commands
// ============================================================================

/// Executes the `aggregate` command.
async fn command_aggregate(command: &AggregateCommand) -> CliResult<ExitCode> {
    let request = hub_request(&command.hub)?;
    run_hub(command.hub.config.as_deref(), &request).await
}

/// Executes the `compare` command.
async fn command_compare(command: &CompareCommand) -> CliResult<ExitCode> {
    let mut request = hub_request(&command.hub)?;
    request.compare = Some(command.metric.clone());
    run_hub(command.hub.config.as_deref(), &request).await
}

/// Builds the hub from config, handles one request, and prints the response.
///
/// Partition failures are part of the printed response; the exit code only
/// reflects whether a response was produced.
async fn run_hub(config_path: Option<&Path>, request: &HubRequest) -> CliResult<ExitCode> {
    let config = HubConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let hub = build_hub(&config).await?;
    let response = hub.handle(request).await.map_err(|err| CliError::new(err.to_string()))?;
    write_json(&response)?;
    Ok(ExitCode::SUCCESS)
}

/// Assembles a [`HubRequest`] from a request file or individual flags.
fn hub_request(args: &HubArgs) -> CliResult<HubRequest> {
    if let Some(path) = &args.request {
        let bytes = read_bytes_with_limit(path, MAX_REQUEST_BYTES)
            .map_err(|err| CliError::new(read_error(path, &err)))?;
        return serde_json::from_slice(&bytes).map_err(|err| {
            CliError::new(format!("invalid hub request {}: {err}", path.display()))
        });
    }
    let partitions = if args.partitions.is_empty() {
        None
    } else {
        Some(args.partitions.iter().map(PartitionId::new).collect())
    };
    Ok(HubRequest {
        query: args.query.clone(),
        partitions,
        operation: args.operation.as_deref().map(OperationName::new),
        arguments: parse_arguments(args.arguments.as_deref())?,
        ..HubRequest::default()
    })
}

/// Wires the configured collaborators into a hub.
async fn build_hub(config: &HubConfig) -> CliResult<Hub> {
    let audit = build_audit_sink(&config.audit)?;
    let registry = Arc::new(
        config
            .build_registry()
            .map_err(|err| CliError::new(format!("failed to build partition registry: {err}")))?,
    );
    let boundary = Arc::new(StsTrustBoundary::from_config(&config.broker).await);
    let issuing = RegistryCredentialBroker::new(
        Arc::clone(&registry),
        boundary,
        BrokerSettings::from(&config.broker),
    )
    .with_audit(Arc::clone(&audit));
    let broker: Arc<dyn CredentialBroker> = if config.broker.cache_credentials {
        Arc::new(
            CachingCredentialBroker::new(Arc::new(issuing))
                .with_margin(config.broker.refresh_margin())
                .with_audit(Arc::clone(&audit)),
        )
    } else {
        Arc::new(issuing)
    };
    let client = RemoteToolClient::new(ClientSettings::from(&config.client))
        .map_err(|err| CliError::new(err.to_string()))?
        .with_audit(Arc::clone(&audit));
    let aggregator = Aggregator::new(
        registry,
        broker,
        Arc::new(client),
        AggregatorSettings::from(&config.aggregator),
    )
    .with_audit(audit);
    Ok(Hub::new(aggregator))
}

/// Opens the configured audit sink.
fn build_audit_sink(config: &AuditConfig) -> CliResult<Arc<dyn AuditSink>> {
    match config.sink {
        AuditSinkKind::Stderr => Ok(Arc::new(StderrAuditSink)),
        AuditSinkKind::None => Ok(Arc::new(NoopAuditSink)),
        AuditSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                CliError::new("audit.path is required for the file sink".to_string())
            })?;
            let sink = FileAuditSink::new(Path::new(path))
                .map_err(|err| CliError::new(format!("failed to open audit log {path}: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Dispatch Command
// ============================================================================

/// Executes the `dispatch` command.
///
/// Exits with failure when the service answers with an error envelope.
async fn command_dispatch(command: &DispatchCommand) -> CliResult<ExitCode> {
    let request = ToolRequest {
        operation: command.operation.as_deref().map(OperationName::new),
        arguments: parse_arguments(command.arguments.as_deref())?,
    };
    let service = load_service(command).await?;
    let dispatcher = AmbiguousDispatcher::new(service);
    let response = dispatcher.handle(&request);
    write_json(&response)?;
    if response.success { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

/// Loads the selected service from a local file or the configured store.
async fn load_service(command: &DispatchCommand) -> CliResult<Arc<dyn PartitionService>> {
    let (store, location): (Box<dyn ObjectStore>, DatasetLocation) = match &command.dataset {
        Some(path) => {
            let bytes = read_bytes_with_limit(path, MAX_OBJECT_BYTES)
                .map_err(|err| CliError::new(read_error(path, &err)))?;
            let key = command.service.dataset_key();
            let store = InMemoryObjectStore::new();
            store.put(LOCAL_BUCKET, key, bytes).map_err(|err| CliError::new(err.to_string()))?;
            let location = DatasetLocation {
                bucket: LOCAL_BUCKET.to_string(),
                key: key.to_string(),
            };
            (Box::new(store), location)
        }
        None => {
            let config = HubConfig::load(command.config.as_deref())
                .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
            let Some(store_config) = config.store else {
                return Err(CliError::new(
                    "dispatch needs --dataset or a [store] section in the config".to_string(),
                ));
            };
            let store = S3ObjectStore::from_config(&store_config)
                .await
                .map_err(|err| CliError::new(err.to_string()))?;
            let location = DatasetLocation {
                bucket: store_config.bucket,
                key: command
                    .key
                    .clone()
                    .unwrap_or_else(|| command.service.dataset_key().to_string()),
            };
            (Box::new(store), location)
        }
    };
    let service: Arc<dyn PartitionService> = match command.service {
        ServiceArg::Corporate => Arc::new(
            CorporateBankingService::load(store.as_ref(), &location)
                .await
                .map_err(|err| CliError::new(err.to_string()))?,
        ),
        ServiceArg::Treasury => Arc::new(
            TreasuryRiskService::load(store.as_ref(), &location)
                .await
                .map_err(|err| CliError::new(err.to_string()))?,
        ),
    };
    Ok(service)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = HubConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line(&format!("config ok: {} partition(s)", config.partitions.len()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Parses an inline argument bag; absent means empty.
fn parse_arguments(raw: Option<&str>) -> CliResult<ArgumentBag> {
    let Some(raw) = raw else {
        return Ok(ArgumentBag::new());
    };
    if raw.len() > MAX_ARGUMENTS_BYTES {
        return Err(CliError::new(format!(
            "--arguments exceeds {MAX_ARGUMENTS_BYTES} bytes"
        )));
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(bag)) => Ok(bag),
        Ok(_) => Err(CliError::new("--arguments must be a JSON object".to_string())),
        Err(err) => Err(CliError::new(format!("--arguments is not valid JSON: {err}"))),
    }
}

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure.
fn read_error(path: &Path, error: &ReadLimitError) -> String {
    match error {
        ReadLimitError::Io(err) => format!("failed to read {}: {err}", path.display()),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => format!("{} is {size} bytes, limit is {limit}", path.display()),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
