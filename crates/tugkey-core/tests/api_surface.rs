//! Compile-only test to verify the public API surface.
//!
//! If this file fails to compile, the public API has regressed.

#![allow(unused_imports)]

use tugkey_core::api::{encode, resolve, KeyOptions, SymbolKeys};
use tugkey_core::candidates::{CandidateSet, Candidates, EmptyReason};
use tugkey_core::codec::{CodecRegistry, DecodeFn, EncodeFn, KeyCodec};
use tugkey_core::error::{EncodingError, GraphError, MalformedKeyError, ResolveError};
use tugkey_core::graph::{
    children_of_kind, parameters, roots_of_kind, Entity, EntityId, EntityKind, GraphSnapshot,
    GraphVersion, SemanticGraph, SymbolGraph, GRAPH_SCHEMA_VERSION,
};
use tugkey_core::key::{SymbolKey, KEY_FORMAT_VERSION};
use tugkey_core::pool::{BufferPool, PoolConfig, PooledBuffer};
use tugkey_core::reader::KeyReader;
use tugkey_core::writer::KeyWriter;

#[test]
fn api_surface_compiles() {
    fn assert_sync<T: Sync>() {}
    assert_sync::<BufferPool>();
    assert_sync::<SymbolGraph>();
    assert_sync::<CandidateSet>();
    assert_sync::<SymbolKeys<'static>>();

    assert_eq!(KEY_FORMAT_VERSION, 1);
    assert_eq!(GRAPH_SCHEMA_VERSION, 1);
}
