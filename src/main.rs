//! Halldyll plan CLI entrypoint.
//!
//! This is the main entrypoint for the halldyll-plan command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use halldyll_provider_sdk::cli::{Cli, Commands, OutputFormatter};
use halldyll_provider_sdk::config::{find_schema_file, SchemaDocument, SchemaParser, SchemaValidator};
use halldyll_provider_sdk::error::{Result, SdkError};
use halldyll_provider_sdk::planner::{plan_resource_change, PlanResourceChangeRequest};
use halldyll_provider_sdk::resource::Resource;
use halldyll_provider_sdk::value::Value;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<ExitCode> {
    let formatter = OutputFormatter::new(cli.output);

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(cli.schema.as_ref(), warnings, &formatter),
        Commands::Plan {
            config,
            prior_state,
            proposed,
        } => {
            cmd_plan(
                cli.schema.as_ref(),
                &config,
                prior_state.as_deref(),
                proposed.as_deref(),
                &formatter,
            )
            .await
        }
        Commands::Describe => cmd_describe(cli.schema.as_ref(), &formatter),
    }
}

/// Validate the schema document.
fn cmd_validate(
    schema_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let document = load_document(schema_path)?;
    info!("Validating schema for resource type: {}", document.resource.type_name);

    let result = SchemaValidator::new().check(&document);
    emit(&formatter.format_validation(&document, &result, show_warnings))?;

    Ok(if result.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Compute and display a plan.
async fn cmd_plan(
    schema_path: Option<&PathBuf>,
    config_path: &Path,
    prior_state_path: Option<&Path>,
    proposed_path: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<ExitCode> {
    let resource = load_resource(schema_path)?;
    let resource_type = resource.schema().value_type();

    // Value documents are resolved against the working directory.
    let values = SchemaParser::new();
    let load_optional = |path: Option<&Path>| -> Result<Value> {
        path.map_or(Ok(Value::Null), |p| values.load_value(p, &resource_type))
    };
    let request = PlanResourceChangeRequest {
        config: values.load_value(config_path, &resource_type)?,
        prior_state: load_optional(prior_state_path)?,
        proposed_new_state: load_optional(proposed_path)?,
    };
    let prior_state = request.prior_state.clone();

    // Cancel on Ctrl-C
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling plan");
            signal_token.cancel();
        }
    });

    let planning_resource = resource.clone();
    let response = tokio::task::spawn_blocking(move || {
        plan_resource_change(&planning_resource, request, &cancel)
    })
    .await
    .map_err(|e| SdkError::internal(format!("Planning task failed: {e}")))?;
    signal_task.abort();

    debug!(
        diagnostics = response.diagnostics.len(),
        "Plan computed"
    );
    emit(&formatter.format_plan(&resource, &prior_state, &response))?;

    Ok(if response.has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Describe the schema attributes.
fn cmd_describe(schema_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<ExitCode> {
    let resource = load_resource(schema_path)?;
    emit(&formatter.format_schema(&resource))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Resolves the schema file path.
fn resolve_schema_path(schema_path: Option<&PathBuf>) -> Result<PathBuf> {
    schema_path.map_or_else(|| find_schema_file("."), |path| Ok(path.clone()))
}

/// Loads the schema document, with `.env` and environment overrides applied.
fn load_document(schema_path: Option<&PathBuf>) -> Result<SchemaDocument> {
    let schema_file = resolve_schema_path(schema_path)?;
    debug!("Loading schema from: {}", schema_file.display());

    SchemaParser::new()
        .with_base_path(schema_file.parent().unwrap_or_else(|| Path::new(".")))
        .load_dotenv()?;

    SchemaParser::new().load_with_env(&schema_file)
}

/// Loads, validates and builds the resource definition.
fn load_resource(schema_path: Option<&PathBuf>) -> Result<Resource> {
    let document = load_document(schema_path)?;
    let result = SchemaValidator::new().validate(&document)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok(document.to_resource()?)
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}
