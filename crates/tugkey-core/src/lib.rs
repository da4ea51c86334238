//! Core infrastructure for tugkey.
//!
//! This crate provides stable symbolic identity for entities of a semantic graph:
//! - Semantic graph model and the provider trait the key protocol queries
//! - Symbol keys: compact, printable, self-describing identifiers
//! - Per-category codec registry (encode/decode function pairs)
//! - Key writer and key reader driving the codecs over the containment chain
//! - Candidate sets describing resolution results (empty, single, ambiguous)
//! - Buffer pool for allocation-free unions during resolution
//! - Error types for encoding, malformed keys, and exact resolution
//!
//! ## Quick Start
//!
//! ```
//! use tugkey_core::graph::SymbolGraph;
//!
//! let mut graph = SymbolGraph::new();
//! let asm = graph.add_assembly("Core");
//! let module = graph.add_module(asm, "Core.dll");
//! let global = graph.add_namespace(Some(module), "");
//! let list = graph.add_type(global, "List", 1);
//!
//! let key = tugkey_core::encode(&graph, list).unwrap();
//! let resolved = tugkey_core::resolve(&key, &graph);
//! assert_eq!(resolved.exact().unwrap(), list);
//! ```

pub mod api;
pub mod candidates;
pub mod codec;
pub mod error;
pub mod graph;
pub mod key;
pub mod pool;
pub mod reader;
pub mod writer;

pub use api::{encode, resolve, KeyOptions, SymbolKeys};
pub use candidates::{CandidateSet, EmptyReason};
pub use error::{EncodingError, GraphError, MalformedKeyError, ResolveError};
pub use graph::{Entity, EntityId, EntityKind, GraphVersion, SemanticGraph, SymbolGraph};
pub use key::SymbolKey;
