//! Binary entry point for the tugkey CLI.
//!
//! All output is JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Encode an entity of a graph snapshot
//! tugkey encode --graph graph.json --entity ent_12
//!
//! # Resolve a key against (another version of) the graph
//! tugkey resolve --graph graph.json --key 'v1:(T (N _ "System") "List" 1)'
//!
//! # Round-trip every entity of a graph
//! tugkey check --graph graph.json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tugkey::cli::{load_graph, run_check, run_encode, run_resolve};
use tugkey::{emit_response, CliError, ErrorResponse, KeyOptions, OutputErrorCode, SymbolKeys};
use tugkey_core::pool::{BufferPool, PoolConfig};

// ============================================================================
// CLI Structure
// ============================================================================

/// Stable symbol keys for semantic graphs.
///
/// Keys identify an entity by its containment chain rather than by id, so a
/// key encoded from one version of a graph resolves against the next.
#[derive(Parser, Debug)]
#[command(name = "tugkey", version, about = "Stable symbol keys for semantic graphs")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Graph snapshot file (JSON).
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Maximum segment nesting for both encoding and resolving.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Allocate fresh scratch buffers instead of recycling them.
    #[arg(long, global = true)]
    no_pool: bool,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode an entity into a symbol key.
    Encode {
        /// Entity id (`ent_<n>` or `<n>`).
        #[arg(long)]
        entity: String,
    },
    /// Resolve a symbol key against the graph.
    Resolve {
        /// Key text as printed by `encode`.
        #[arg(long)]
        key: String,
        /// Fail (exit 3) unless the key resolves to exactly one entity.
        #[arg(long)]
        exact: bool,
    },
    /// Encode and resolve every entity, reporting round-trip failures.
    Check,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let _ = emit_response(&ErrorResponse::new(&err), &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn key_options(global: &GlobalArgs) -> KeyOptions {
    match global.max_depth {
        Some(depth) => KeyOptions::default()
            .with_max_encode_depth(depth)
            .with_max_decode_depth(depth),
        None => KeyOptions::default(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<ExitCode, CliError> {
    let path = cli
        .global
        .graph
        .as_deref()
        .ok_or_else(|| CliError::invalid_args("missing --graph <file>"))?;
    let graph = load_graph(path)?;

    let local_pool;
    let keys = if cli.global.no_pool {
        local_pool = BufferPool::new(PoolConfig::disabled());
        SymbolKeys::new(key_options(&cli.global)).with_pool(&local_pool)
    } else {
        SymbolKeys::new(key_options(&cli.global))
    };

    match cli.command {
        Command::Encode { entity } => emit(&run_encode(&graph, &keys, &entity)?),
        Command::Resolve { key, exact } => emit(&run_resolve(&graph, &keys, &key, exact)?),
        Command::Check => {
            let response = run_check(&graph, &keys)?;
            emit(&response)?;
            if response.has_failures() {
                return Ok(ExitCode::from(OutputErrorCode::ResolutionError.code()));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn emit<T: Serialize>(response: &T) -> Result<ExitCode, CliError> {
    emit_response(response, &mut io::stdout())?;
    let _ = io::stdout().flush();
    Ok(ExitCode::SUCCESS)
}
