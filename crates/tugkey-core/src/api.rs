//! Top-level encode and resolve operations.
//!
//! [`SymbolKeys`] bundles the options and the buffer pool used by both
//! directions. The free functions [`encode`] and [`resolve`] use the defaults
//! and the process-wide pool.
//!
//! Every call builds its own [`KeyWriter`] or [`KeyReader`]; no state is
//! carried between calls, so a shared `SymbolKeys` may be used from many
//! threads against a graph that is not being mutated.

use tracing::debug;

use crate::candidates::CandidateSet;
use crate::error::EncodingError;
use crate::graph::{EntityId, SemanticGraph};
use crate::key::SymbolKey;
use crate::pool::BufferPool;
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

// ============================================================================
// Options
// ============================================================================

/// Limits applied by [`SymbolKeys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOptions {
    /// Maximum segment nesting when encoding. Exceeding it fails with
    /// [`EncodingError::DepthExceeded`], which also catches containment cycles.
    pub max_encode_depth: usize,
    /// Maximum segment nesting accepted when resolving. Deeper keys resolve
    /// to an empty set with a malformed-key diagnostic.
    pub max_decode_depth: usize,
}

impl Default for KeyOptions {
    fn default() -> Self {
        KeyOptions {
            max_encode_depth: 64,
            max_decode_depth: 256,
        }
    }
}

impl KeyOptions {
    /// Set the encode nesting bound.
    pub fn with_max_encode_depth(mut self, depth: usize) -> Self {
        self.max_encode_depth = depth;
        self
    }

    /// Set the decode nesting bound.
    pub fn with_max_decode_depth(mut self, depth: usize) -> Self {
        self.max_decode_depth = depth;
        self
    }
}

// ============================================================================
// SymbolKeys
// ============================================================================

/// Encoder and resolver sharing one configuration.
#[derive(Debug, Clone)]
pub struct SymbolKeys<'p> {
    options: KeyOptions,
    pool: &'p BufferPool,
}

impl Default for SymbolKeys<'static> {
    fn default() -> Self {
        SymbolKeys::new(KeyOptions::default())
    }
}

impl SymbolKeys<'static> {
    /// Create with the given options and the process-wide buffer pool.
    pub fn new(options: KeyOptions) -> Self {
        SymbolKeys {
            options,
            pool: BufferPool::global(),
        }
    }
}

impl<'p> SymbolKeys<'p> {
    /// Use `pool` for resolution scratch buffers.
    pub fn with_pool<'q>(self, pool: &'q BufferPool) -> SymbolKeys<'q> {
        SymbolKeys {
            options: self.options,
            pool,
        }
    }

    /// The configured limits.
    pub fn options(&self) -> &KeyOptions {
        &self.options
    }

    /// The pool used for resolution.
    pub fn pool(&self) -> &'p BufferPool {
        self.pool
    }

    /// Encode the entity `id` of `graph`.
    ///
    /// Deterministic: the same entity in the same graph always produces the
    /// same key. Fails if any entity on the containment chain cannot be keyed.
    pub fn encode(
        &self,
        graph: &dyn SemanticGraph,
        id: EntityId,
    ) -> Result<SymbolKey, EncodingError> {
        let mut writer = KeyWriter::new(graph, self.options.max_encode_depth);
        match writer.write_key(id) {
            Ok(()) => Ok(writer.finish()),
            Err(err) => {
                debug!(entity = %id, error = %err, "encode failed");
                Err(err)
            }
        }
    }

    /// Resolve `key` against `graph`.
    ///
    /// Never fails: a malformed key yields an empty set whose
    /// [`empty_reason`](CandidateSet::empty_reason) carries the parse error.
    pub fn resolve(&self, key: &SymbolKey, graph: &dyn SemanticGraph) -> CandidateSet {
        self.resolve_str(key.as_str(), graph)
    }

    /// Resolve key text that has not been wrapped in a [`SymbolKey`].
    pub fn resolve_str(&self, key: &str, graph: &dyn SemanticGraph) -> CandidateSet {
        let mut reader = KeyReader::new(key, graph, self.pool, self.options.max_decode_depth);
        match reader.read_root() {
            Ok(candidates) => candidates,
            Err(err) => {
                debug!(key, offset = err.offset(), error = %err, "malformed key");
                CandidateSet::malformed(err)
            }
        }
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Encode an entity with default options.
pub fn encode(graph: &dyn SemanticGraph, id: EntityId) -> Result<SymbolKey, EncodingError> {
    SymbolKeys::default().encode(graph, id)
}

/// Resolve a key with default options and the process-wide pool.
pub fn resolve(key: &SymbolKey, graph: &dyn SemanticGraph) -> CandidateSet {
    SymbolKeys::default().resolve(key, graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::EmptyReason;
    use crate::error::MalformedKeyError;
    use crate::graph::{EntityKind, SymbolGraph};
    use crate::pool::PoolConfig;

    fn sample() -> (SymbolGraph, EntityId) {
        let mut graph = SymbolGraph::new();
        let asm = graph.add_assembly("Core");
        let module = graph.add_module(asm, "Core.dll");
        let global = graph.add_namespace(Some(module), "");
        let ty = graph.add_type(global, "Widget", 0);
        (graph, ty)
    }

    mod option_tests {
        use super::*;

        #[test]
        fn defaults() {
            let options = KeyOptions::default();
            assert_eq!(options.max_encode_depth, 64);
            assert_eq!(options.max_decode_depth, 256);
        }

        #[test]
        fn encode_depth_is_enforced() {
            let (graph, ty) = sample();
            let keys = SymbolKeys::new(KeyOptions::default().with_max_encode_depth(2));
            let err = keys.encode(&graph, ty).unwrap_err();
            assert!(matches!(err, EncodingError::DepthExceeded { limit: 2, .. }));
        }

        #[test]
        fn decode_depth_is_enforced() {
            let (graph, ty) = sample();
            let key = encode(&graph, ty).unwrap();
            let keys = SymbolKeys::new(KeyOptions::default().with_max_decode_depth(2));
            let candidates = keys.resolve(&key, &graph);
            assert!(matches!(
                candidates.empty_reason(),
                Some(EmptyReason::Malformed(MalformedKeyError::NestingTooDeep {
                    limit: 2,
                    ..
                }))
            ));
        }
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn local_is_unsupported() {
            let (mut graph, ty) = sample();
            let method = graph.add_method(ty, "Run", 0);
            let local = graph.add_local(method, "tmp");
            let err = encode(&graph, local).unwrap_err();
            assert_eq!(
                err,
                EncodingError::UnsupportedKind {
                    id: local,
                    kind: EntityKind::Local
                }
            );
        }

        #[test]
        fn malformed_text_degrades_to_empty() {
            let (graph, _) = sample();
            let keys = SymbolKeys::default();
            for text in ["", "v1:", "v1:(", "v1:(T", "garbage", "v9:(A \"Core\")"] {
                let candidates = keys.resolve_str(text, &graph);
                assert!(candidates.is_empty(), "{:?}", text);
                assert!(
                    matches!(candidates.empty_reason(), Some(EmptyReason::Malformed(_))),
                    "{:?}",
                    text
                );
            }
        }

        #[test]
        fn explicit_pool_is_used_and_drained() {
            let (graph, ty) = sample();
            let pool = BufferPool::new(PoolConfig::default());
            let keys = SymbolKeys::new(KeyOptions::default()).with_pool(&pool);
            let key = keys.encode(&graph, ty).unwrap();

            assert_eq!(keys.resolve(&key, &graph).exact(), Ok(ty));
            assert_eq!(pool.outstanding(), 0);
            assert!(pool.retained() > 0);

            let truncated = &key.as_str()[..key.len() - 1];
            assert!(keys.resolve_str(truncated, &graph).is_empty());
            assert_eq!(pool.outstanding(), 0);
        }
    }
}
