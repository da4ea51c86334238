//! Error types for the symbol key protocol.
//!
//! The protocol distinguishes failures by who can act on them:
//!
//! - [`EncodingError`]: the caller asked to encode an entity that cannot be
//!   keyed. Encoding is all-or-nothing and the error surfaces immediately.
//! - [`MalformedKeyError`]: a key could not be parsed. These never escape
//!   [`resolve`](crate::resolve); they are attached to an empty
//!   [`CandidateSet`](crate::CandidateSet) as its diagnostic.
//! - [`ResolveError`]: an exact-identity caller got zero or several candidates.
//! - [`GraphError`]: a graph snapshot failed to load.
//!
//! An ambiguous resolution is not an error. It is valid data carried by the
//! candidate set itself.

use thiserror::Error;

use crate::graph::{EntityId, EntityKind};

// ============================================================================
// Encoding Errors
// ============================================================================

/// Error raised while encoding an entity into a [`SymbolKey`](crate::SymbolKey).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The entity id does not exist in the graph being encoded.
    #[error("entity {id} does not exist in the graph")]
    UnknownEntity { id: EntityId },

    /// The entity's category has no registered codec.
    #[error("entity {id} has kind '{kind}' which has no key codec")]
    UnsupportedKind { id: EntityId, kind: EntityKind },

    /// The entity's category requires a container but the entity has none.
    #[error("entity {id} of kind '{kind}' has no containing entity")]
    MissingContainer { id: EntityId, kind: EntityKind },

    /// A category-specific attribute required by the codec is absent.
    #[error("entity {id} of kind '{kind}' is missing its {attribute}")]
    MissingAttribute {
        id: EntityId,
        kind: EntityKind,
        attribute: &'static str,
    },

    /// Recursion through the containment chain exceeded the configured bound.
    ///
    /// This signals a cyclic or pathologically deep containment chain.
    #[error("containment chain of entity {id} exceeds {limit} levels")]
    DepthExceeded { id: EntityId, limit: usize },
}

// ============================================================================
// Malformed Key Errors
// ============================================================================

/// Error raised while parsing a key that is truncated or structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedKeyError {
    /// The key ended while more input was expected.
    #[error("key truncated at offset {offset}: expected {expected}")]
    Truncated {
        offset: usize,
        expected: &'static str,
    },

    /// The input at `offset` does not match the grammar.
    #[error("unexpected input at offset {offset}: expected {expected}")]
    Unexpected {
        offset: usize,
        expected: &'static str,
    },

    /// A segment carries a discriminant no codec is registered for.
    #[error("unknown discriminant '{found}' at offset {offset}")]
    UnknownDiscriminant { offset: usize, found: char },

    /// The key header names a format version this build cannot read.
    #[error("incompatible key format version '{found}' (supported: {supported})")]
    IncompatibleVersion { found: String, supported: u32 },

    /// Segments are nested deeper than the reader allows.
    #[error("key nesting exceeds {limit} levels at offset {offset}")]
    NestingTooDeep { offset: usize, limit: usize },

    /// A complete key was read but input remains.
    #[error("unexpected trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

impl MalformedKeyError {
    /// Byte offset into the key text where parsing failed, if known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            MalformedKeyError::Truncated { offset, .. }
            | MalformedKeyError::Unexpected { offset, .. }
            | MalformedKeyError::UnknownDiscriminant { offset, .. }
            | MalformedKeyError::NestingTooDeep { offset, .. }
            | MalformedKeyError::TrailingInput { offset } => Some(*offset),
            MalformedKeyError::IncompatibleVersion { .. } => None,
        }
    }
}

// ============================================================================
// Exact Resolution Errors
// ============================================================================

/// Error returned by [`CandidateSet::exact`](crate::CandidateSet::exact).
///
/// Callers that need exact identity (rename, go-to-definition) must not pick
/// one candidate out of several.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No candidate matched the key.
    #[error("key did not resolve to any entity: {reason}")]
    NotFound { reason: String },

    /// More than one candidate matched the key.
    #[error("key is ambiguous: {count} candidates")]
    Ambiguous { count: usize },
}

// ============================================================================
// Graph Errors
// ============================================================================

/// Error raised while loading or validating a graph snapshot.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An entity references an id that is not part of the snapshot.
    #[error("entity {id} references missing entity {missing} ({field})")]
    DanglingReference {
        id: EntityId,
        missing: EntityId,
        field: &'static str,
    },

    /// Two entities in the snapshot share one id.
    #[error("duplicate entity id {id}")]
    DuplicateId { id: EntityId },

    /// The id is outside the range the graph can allocate after it.
    #[error("entity id {id} is reserved")]
    ReservedId { id: EntityId },

    /// The snapshot was written with a different schema version.
    #[error("unsupported graph schema version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    /// The snapshot is not valid JSON for the graph schema.
    #[error("invalid graph snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_offsets() {
        let err = MalformedKeyError::Truncated {
            offset: 7,
            expected: "')'",
        };
        assert_eq!(err.offset(), Some(7));

        let err = MalformedKeyError::IncompatibleVersion {
            found: "9".to_string(),
            supported: 1,
        };
        assert_eq!(err.offset(), None);
    }

    #[test]
    fn error_messages_name_the_entity() {
        let err = EncodingError::UnsupportedKind {
            id: EntityId::new(4),
            kind: EntityKind::Local,
        };
        assert_eq!(
            err.to_string(),
            "entity ent_4 has kind 'local' which has no key codec"
        );

        let err = ResolveError::Ambiguous { count: 2 };
        assert_eq!(err.to_string(), "key is ambiguous: 2 candidates");
    }
}
