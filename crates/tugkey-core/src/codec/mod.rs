//! Per-category key codecs and the registry that dispatches to them.
//!
//! Every entity category owns one [`KeyCodec`]: a discriminant character plus
//! an encode function and a decode function. The functions are plain `fn`
//! pointers with no state of their own; all state lives in the
//! [`KeyWriter`] or [`KeyReader`] driving them.
//!
//! ## Encode
//!
//! The writer emits `(` and the discriminant, calls the codec's encode
//! function, then emits `)`. The encode function writes only what
//! distinguishes the entity *within its container*; the container itself is
//! written through [`KeyWriter::write_key`], which recurses.
//!
//! ## Decode
//!
//! Every decode function follows the same steps:
//!
//! 1. Read all of its fields, resolving the container segment first.
//! 2. If the container resolved to nothing, return an empty set.
//! 3. Enumerate the children of each candidate container with this category
//!    and keep those whose discriminating fields match.
//! 4. Union the matches across containers (deduplicated, discovery order) in a
//!    pooled buffer and package them as a [`CandidateSet`].
//!
//! ## Registered Categories
//!
//! | Disc | Kind | Module |
//! |------|------|--------|
//! | `A` | Assembly | [`assembly`] |
//! | `D` | Module | [`module`] |
//! | `N` | Namespace | [`namespace`] |
//! | `T` | NamedType | [`named_type`] |
//! | `G` | TypeParameter | [`type_parameter`] |
//! | `!` | (method type parameter by ordinal) | [`method_type_parameter`] |
//! | `M` | Method | [`method`] |
//! | `P` | Parameter | [`parameter`] |
//! | `F` | Field | [`field`] |
//! | `R` | Property | [`property`] |
//! | `Y` | ArrayType | [`array_type`] |
//!
//! [`EntityKind::Local`] has no codec; encoding a local fails with
//! [`EncodingError::UnsupportedKind`].

pub mod array_type;
pub mod assembly;
pub mod field;
pub mod method;
pub mod method_type_parameter;
pub mod module;
pub mod named_type;
pub mod namespace;
pub mod parameter;
pub mod property;
pub mod type_parameter;

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{children_of_kind, parameters, Entity, EntityId, EntityKind, SemanticGraph};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

static REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();

/// Writes the fields of one segment.
pub type EncodeFn = fn(&Entity, &mut KeyWriter<'_>) -> Result<(), EncodingError>;

/// Reads the fields of one segment and resolves them against the reader's graph.
pub type DecodeFn = fn(&mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError>;

/// The encode/decode pair of one entity category.
#[derive(Debug, Clone, Copy)]
pub struct KeyCodec {
    /// Category handled by this codec.
    pub kind: EntityKind,
    /// Discriminant written at the start of the category's segments.
    pub discriminant: char,
    /// Field writer.
    pub encode: EncodeFn,
    /// Field reader and resolver.
    pub decode: DecodeFn,
}

/// The codec for `kind`, if the category can be keyed.
///
/// This match is the single place categories are wired to codecs; adding an
/// [`EntityKind`] variant fails to compile until it is handled here.
fn codec_for_kind(kind: EntityKind) -> Option<KeyCodec> {
    match kind {
        EntityKind::Assembly => Some(assembly::CODEC),
        EntityKind::Module => Some(module::CODEC),
        EntityKind::Namespace => Some(namespace::CODEC),
        EntityKind::NamedType => Some(named_type::CODEC),
        EntityKind::TypeParameter => Some(type_parameter::CODEC),
        EntityKind::Method => Some(method::CODEC),
        EntityKind::Parameter => Some(parameter::CODEC),
        EntityKind::Field => Some(field::CODEC),
        EntityKind::Property => Some(property::CODEC),
        EntityKind::ArrayType => Some(array_type::CODEC),
        EntityKind::Local => None,
    }
}

/// Process-wide table of codecs, keyed by category and by discriminant.
///
/// Built once on first use and never mutated afterwards.
#[derive(Debug)]
pub struct CodecRegistry {
    by_kind: HashMap<EntityKind, KeyCodec>,
    decoders: HashMap<char, DecodeFn>,
}

impl CodecRegistry {
    /// Get the global codec registry singleton.
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut registry = CodecRegistry {
            by_kind: HashMap::new(),
            decoders: HashMap::new(),
        };

        for kind in EntityKind::ALL {
            if let Some(codec) = codec_for_kind(kind) {
                registry.register(codec);
            }
        }

        // Decode-only form written by the writer for method type parameters
        // referenced from their own method's signature.
        registry.decoders.insert(
            method_type_parameter::DISCRIMINANT,
            method_type_parameter::decode,
        );

        registry
    }

    fn register(&mut self, codec: KeyCodec) {
        debug_assert!(
            !self.decoders.contains_key(&codec.discriminant),
            "discriminant '{}' registered twice",
            codec.discriminant
        );
        self.decoders.insert(codec.discriminant, codec.decode);
        self.by_kind.insert(codec.kind, codec);
    }

    /// The codec for a category, or `None` for categories without keys.
    pub fn codec(&self, kind: EntityKind) -> Option<&KeyCodec> {
        self.by_kind.get(&kind)
    }

    /// The decode function for a discriminant.
    pub fn decoder(&self, discriminant: char) -> Option<DecodeFn> {
        self.decoders.get(&discriminant).copied()
    }

    /// All discriminants the registry can decode.
    pub fn discriminants(&self) -> impl Iterator<Item = char> + '_ {
        self.decoders.keys().copied()
    }
}

// ============================================================================
// Shared Codec Helpers
// ============================================================================

/// Children of every scope in `scopes` with the given kind that satisfy
/// `matches`, unioned in discovery order.
pub(crate) fn collect_children(
    reader: &KeyReader<'_>,
    scopes: &CandidateSet,
    kind: EntityKind,
    mut matches: impl FnMut(&Entity) -> bool,
) -> CandidateSet {
    let graph = reader.graph();
    let mut result = reader.pool().checkout();
    for scope in scopes {
        for child in children_of_kind(graph, scope, kind) {
            if matches(child) {
                result.push_unique(child.id);
            }
        }
    }
    CandidateSet::from_candidates(&result)
}

/// Declared types of the parameters of `owner`, in ordinal order.
pub(crate) fn parameter_types(
    graph: &dyn SemanticGraph,
    owner: &Entity,
) -> Result<Vec<EntityId>, EncodingError> {
    parameters(graph, owner.id)
        .into_iter()
        .map(|param| {
            param.ty.ok_or(EncodingError::MissingAttribute {
                id: param.id,
                kind: param.kind,
                attribute: "type",
            })
        })
        .collect()
}

/// True if every parameter's declared type is among the candidates resolved
/// for the same position of an encoded signature.
pub(crate) fn signature_matches(params: &[&Entity], signature: &[CandidateSet]) -> bool {
    params.len() == signature.len()
        && params
            .iter()
            .zip(signature)
            .all(|(param, candidates)| param.ty.is_some_and(|ty| candidates.contains(ty)))
}
