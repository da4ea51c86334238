//! JSON output types for CLI responses.
//!
//! These types are the CLI's output contract:
//!
//! 1. **Status first:** every response starts with `status`.
//! 2. **Versioned:** every response carries `schema_version`.
//! 3. **Deterministic:** the same graph and arguments produce the same bytes.
//! 4. **Absent vs null:** optional fields are omitted when not applicable.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tugkey_core::{CandidateSet, EntityId, EntityKind, SemanticGraph, SymbolGraph};

use crate::error::{CliError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Shared Types
// ============================================================================

/// One entity as shown in responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// Entity id (`ent_N`).
    pub id: String,
    /// Entity category.
    pub kind: EntityKind,
    /// Dotted path, e.g. `[Core] System.List.Add`.
    pub display_name: String,
}

impl EntityInfo {
    /// Describe `id` as it appears in `graph`.
    pub fn describe(graph: &SymbolGraph, id: EntityId) -> Option<Self> {
        let entity = graph.entity(id)?;
        Some(EntityInfo {
            id: id.to_string(),
            kind: entity.kind,
            display_name: graph.display_name(id),
        })
    }
}

// ============================================================================
// Command Responses
// ============================================================================

/// Response for `tugkey encode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub status: String,
    pub schema_version: String,
    /// Content hash of the graph the key was encoded from.
    pub graph_version: String,
    pub entity: EntityInfo,
    pub key: String,
}

/// Response for `tugkey resolve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub status: String,
    pub schema_version: String,
    pub graph_version: String,
    pub key: String,
    pub count: usize,
    pub ambiguous: bool,
    pub candidates: Vec<EntityInfo>,
    /// Why nothing matched; present only for empty results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ResolveResponse {
    /// Build from a resolution result.
    pub fn new(
        graph: &SymbolGraph,
        graph_version: String,
        key: String,
        candidates: &CandidateSet,
    ) -> Self {
        ResolveResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            graph_version,
            key,
            count: candidates.len(),
            ambiguous: candidates.is_ambiguous(),
            candidates: candidates
                .iter()
                .filter_map(|id| EntityInfo::describe(graph, id))
                .collect(),
            reason: candidates.empty_reason().map(|reason| reason.to_string()),
        }
    }
}

/// Counts reported by `tugkey check`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Entities in the graph.
    pub entities: usize,
    /// Entities resolved back to exactly themselves.
    pub exact: usize,
    /// Entities found among several candidates where that is expected
    /// (modules of a multi-module assembly and everything keyed through them).
    pub collapsed: usize,
    /// Entities whose kind has no key codec.
    pub unsupported: usize,
    /// Entities that failed to encode or did not resolve back to themselves.
    pub failures: usize,
}

/// One round-trip failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFailure {
    pub entity: EntityInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub message: String,
}

/// Response for `tugkey check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    /// `ok` when every keyed entity round-trips, `failed` otherwise.
    pub status: String,
    pub schema_version: String,
    pub graph_version: String,
    pub summary: CheckSummary,
    pub failures: Vec<CheckFailure>,
}

impl CheckResponse {
    /// Returns true if any entity failed to round-trip.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, equal to the process exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
}

impl ErrorInfo {
    /// Create from a CliError.
    pub fn from_error(err: &CliError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Response emitted when a command fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Build the response for `err`.
    pub fn new(err: &CliError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugkey_core::error::MalformedKeyError;

    fn sample() -> (SymbolGraph, EntityId) {
        let mut graph = SymbolGraph::new();
        let asm = graph.add_assembly("Core");
        let module = graph.add_module(asm, "Core.dll");
        let global = graph.add_namespace(Some(module), "");
        let ty = graph.add_type(global, "Widget", 0);
        (graph, ty)
    }

    #[test]
    fn status_is_the_first_field() {
        let err = CliError::invalid_args("missing --graph");
        let mut out = Vec::new();
        emit_response(&ErrorResponse::new(&err), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("{\n  \"status\": \"error\""), "{}", text);
        assert!(text.contains("\"code\": 2"));
    }

    #[test]
    fn resolve_response_describes_candidates() {
        let (graph, ty) = sample();
        let response = ResolveResponse::new(
            &graph,
            "abc".to_string(),
            "v1:...".to_string(),
            &CandidateSet::single(ty),
        );
        assert_eq!(response.count, 1);
        assert!(!response.ambiguous);
        assert_eq!(response.candidates[0].display_name, "[Core] Widget");
        assert_eq!(response.candidates[0].kind, EntityKind::NamedType);
        assert!(response.reason.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn empty_resolution_carries_reason() {
        let (graph, _) = sample();
        let candidates = CandidateSet::malformed(MalformedKeyError::TrailingInput { offset: 4 });
        let response =
            ResolveResponse::new(&graph, "abc".to_string(), "v1:x".to_string(), &candidates);
        assert_eq!(response.count, 0);
        assert_eq!(
            response.reason.as_deref(),
            Some("malformed key: unexpected trailing input at offset 4")
        );
    }
}
