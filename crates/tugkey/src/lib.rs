//! tugkey - stable symbol keys from the command line.
//!
//! This crate provides the `tugkey` binary and the command implementations
//! behind it.
//!
//! ## Modules
//!
//! - `cli` - Command implementations (`encode`, `resolve`, `check`)
//! - `error` - Unified CLI error type and exit codes
//! - `output` - JSON response types

pub mod cli;
pub mod error;
pub mod output;

pub use error::{CliError, OutputErrorCode};
pub use output::{emit_response, ErrorResponse, SCHEMA_VERSION};
pub use tugkey_core::{KeyOptions, SymbolKey, SymbolKeys};
