//! Command implementations for the tugkey CLI.
//!
//! Each `run_*` function takes an already loaded graph and a configured
//! [`SymbolKeys`], and returns the response the binary prints. Keeping the
//! work here (rather than in `main.rs`) lets tests drive commands without
//! spawning a process.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, CliError>`. Soft outcomes (an empty or
//! ambiguous resolution, round-trip failures during `check`) are reported in
//! the response instead; only `--exact` turns them into errors.

use std::fs;
use std::path::Path;

use tracing::{debug, info, info_span};
use tugkey_core::graph::children_of_kind;
use tugkey_core::{EntityId, EntityKind, SemanticGraph, SymbolGraph, SymbolKey, SymbolKeys};

use crate::error::CliError;
use crate::output::{
    CheckFailure, CheckResponse, CheckSummary, EncodeResponse, EntityInfo, ResolveResponse,
    SCHEMA_VERSION,
};

// ============================================================================
// Inputs
// ============================================================================

/// Load a graph snapshot file.
pub fn load_graph(path: &Path) -> Result<SymbolGraph, CliError> {
    let shown = path.display().to_string();
    let json = fs::read_to_string(path)
        .map_err(|e| CliError::invalid_args(format!("cannot read graph {}: {}", shown, e)))?;
    let graph = SymbolGraph::from_json(&json).map_err(|e| CliError::graph_load(&shown, e))?;
    debug!(path = %shown, entities = graph.len(), "loaded graph");
    Ok(graph)
}

/// Parse an entity id given as `ent_N` or `N`.
pub fn parse_entity_id(text: &str) -> Result<EntityId, CliError> {
    let digits = text.strip_prefix("ent_").unwrap_or(text);
    digits.parse::<u32>().map(EntityId::new).map_err(|_| {
        CliError::invalid_args(format!(
            "invalid entity id '{}', expected 'ent_<n>' or '<n>'",
            text
        ))
    })
}

fn graph_version(graph: &SymbolGraph) -> Result<String, CliError> {
    graph
        .version()
        .map(|version| version.to_string())
        .map_err(|e| CliError::internal(format!("cannot hash graph: {}", e)))
}

// ============================================================================
// Commands
// ============================================================================

/// Encode one entity.
pub fn run_encode(
    graph: &SymbolGraph,
    keys: &SymbolKeys<'_>,
    entity: &str,
) -> Result<EncodeResponse, CliError> {
    let id = parse_entity_id(entity)?;
    let info = EntityInfo::describe(graph, id).ok_or_else(|| CliError::EntityNotFound {
        id: id.to_string(),
    })?;
    let key = keys.encode(graph, id)?;
    info!(entity = %id, key = %key, "encoded");

    Ok(EncodeResponse {
        status: "ok".to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        graph_version: graph_version(graph)?,
        entity: info,
        key: key.into_string(),
    })
}

/// Resolve one key.
///
/// With `exact`, anything other than a single candidate is an error.
pub fn run_resolve(
    graph: &SymbolGraph,
    keys: &SymbolKeys<'_>,
    key: &str,
    exact: bool,
) -> Result<ResolveResponse, CliError> {
    let key = SymbolKey::from(key);
    let candidates = keys.resolve(&key, graph);
    info!(
        count = candidates.len(),
        ambiguous = candidates.is_ambiguous(),
        "resolved"
    );
    if exact {
        candidates.exact()?;
    }
    Ok(ResolveResponse::new(
        graph,
        graph_version(graph)?,
        key.into_string(),
        &candidates,
    ))
}

/// Encode every entity, resolve each key, and report entities that do not
/// come back.
///
/// An entity counts as collapsed rather than failed when its key resolves to
/// several candidates including itself and its containment chain passes
/// through a module of a multi-module assembly.
pub fn run_check(graph: &SymbolGraph, keys: &SymbolKeys<'_>) -> Result<CheckResponse, CliError> {
    let _span = info_span!("check", entities = graph.len()).entered();
    let mut summary = CheckSummary {
        entities: graph.len(),
        ..Default::default()
    };
    let mut failures = Vec::new();

    for entity in graph.entities() {
        let id = entity.id;
        let describe = || EntityInfo::describe(graph, id);
        if entity.kind == EntityKind::Local {
            summary.unsupported += 1;
            continue;
        }

        let key = match keys.encode(graph, id) {
            Ok(key) => key,
            Err(err) => {
                failures.extend(describe().map(|info| CheckFailure {
                    entity: info,
                    key: None,
                    message: err.to_string(),
                }));
                continue;
            }
        };

        let candidates = keys.resolve(&key, graph);
        let message = if candidates.exact() == Ok(id) {
            summary.exact += 1;
            continue;
        } else if candidates.contains(id) && through_collapsed_module(graph, id) {
            summary.collapsed += 1;
            continue;
        } else if candidates.contains(id) {
            format!("ambiguous: {} candidates", candidates.len())
        } else {
            match candidates.empty_reason() {
                Some(reason) => reason.to_string(),
                None => "resolved to other entities".to_string(),
            }
        };
        failures.extend(describe().map(|info| CheckFailure {
            entity: info,
            key: Some(key.into_string()),
            message,
        }));
    }

    summary.failures = failures.len();
    info!(
        exact = summary.exact,
        collapsed = summary.collapsed,
        failures = summary.failures,
        "check finished"
    );
    Ok(CheckResponse {
        status: if failures.is_empty() { "ok" } else { "failed" }.to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        graph_version: graph_version(graph)?,
        summary,
        failures,
    })
}

/// True if some entity on the containment chain of `id` (itself included) is
/// a module whose assembly has more than one module.
fn through_collapsed_module(graph: &SymbolGraph, id: EntityId) -> bool {
    let mut current = Some(id);
    let mut steps = 0;
    while let Some(next) = current {
        let Some(entity) = graph.entity(next) else {
            return false;
        };
        if entity.kind == EntityKind::Module {
            return entity.container.is_some_and(|assembly| {
                children_of_kind(graph, assembly, EntityKind::Module).count() > 1
            });
        }
        steps += 1;
        if steps > graph.len() {
            return false;
        }
        current = match entity.kind {
            EntityKind::ArrayType => entity.ty,
            _ => entity.container,
        };
    }
    false
}
