//! Key writer: drives the per-category encode functions.
//!
//! A [`KeyWriter`] is created for exactly one top-level encode and consumed by
//! [`KeyWriter::finish`]. It owns the output buffer, the recursion depth guard,
//! and the method signature context.
//!
//! ## Method Signature Context
//!
//! A method's key contains its parameter types, and a parameter type may be a
//! type parameter of that same method. Encoding that type parameter normally
//! would encode its owner (the method) again, forever. While a method writes
//! its signature it is pushed onto the context stack, and type parameters it
//! owns are written as `(! ordinal)` instead.

use tracing::trace;

use crate::codec::{method_type_parameter, CodecRegistry};
use crate::error::EncodingError;
use crate::graph::{Entity, EntityId, EntityKind, SemanticGraph};
use crate::key::{
    header, write_quoted, SymbolKey, ARRAY_CLOSE, ARRAY_OPEN, FIELD_SEPARATOR, NULL_FIELD,
    SEGMENT_CLOSE, SEGMENT_OPEN,
};

/// Accumulates the text of one key.
pub struct KeyWriter<'g> {
    graph: &'g dyn SemanticGraph,
    registry: &'static CodecRegistry,
    out: String,
    depth: usize,
    max_depth: usize,
    method_context: Vec<EntityId>,
}

impl<'g> KeyWriter<'g> {
    /// Create a writer over `graph` that fails once segments nest deeper than
    /// `max_depth`.
    pub fn new(graph: &'g dyn SemanticGraph, max_depth: usize) -> Self {
        KeyWriter {
            graph,
            registry: CodecRegistry::global(),
            out: header(),
            depth: 0,
            max_depth,
            method_context: Vec::new(),
        }
    }

    /// The graph being encoded.
    pub fn graph(&self) -> &'g dyn SemanticGraph {
        self.graph
    }

    /// Write the segment for `id`, recursing through its codec.
    pub fn write_key(&mut self, id: EntityId) -> Result<(), EncodingError> {
        let graph = self.graph;
        let entity = graph
            .entity(id)
            .ok_or(EncodingError::UnknownEntity { id })?;

        if self.depth >= self.max_depth {
            return Err(EncodingError::DepthExceeded {
                id,
                limit: self.max_depth,
            });
        }

        if let Some(ordinal) = self.method_type_parameter_ordinal(entity) {
            self.separate();
            self.out.push(SEGMENT_OPEN);
            self.out.push(method_type_parameter::DISCRIMINANT);
            self.write_u32(ordinal);
            self.out.push(SEGMENT_CLOSE);
            return Ok(());
        }

        let codec = self
            .registry
            .codec(entity.kind)
            .ok_or(EncodingError::UnsupportedKind {
                id,
                kind: entity.kind,
            })?;
        trace!(entity = %id, kind = %entity.kind, depth = self.depth, "encode segment");

        self.separate();
        self.out.push(SEGMENT_OPEN);
        self.out.push(codec.discriminant);

        self.depth += 1;
        let result = (codec.encode)(entity, self);
        self.depth -= 1;
        result?;

        self.out.push(SEGMENT_CLOSE);
        Ok(())
    }

    /// Write the container of `entity`, which must have one.
    pub fn write_container(&mut self, entity: &Entity) -> Result<(), EncodingError> {
        let container = entity.container.ok_or(EncodingError::MissingContainer {
            id: entity.id,
            kind: entity.kind,
        })?;
        self.write_key(container)
    }

    /// Write a segment, or `_` when there is none.
    pub fn write_optional_key(&mut self, id: Option<EntityId>) -> Result<(), EncodingError> {
        match id {
            Some(id) => self.write_key(id),
            None => {
                self.separate();
                self.out.push(NULL_FIELD);
                Ok(())
            }
        }
    }

    /// Write `[seg seg ...]`.
    pub fn write_key_array(&mut self, ids: &[EntityId]) -> Result<(), EncodingError> {
        self.separate();
        self.out.push(ARRAY_OPEN);
        for &id in ids {
            self.write_key(id)?;
        }
        self.out.push(ARRAY_CLOSE);
        Ok(())
    }

    /// Write a quoted string field.
    pub fn write_string(&mut self, value: &str) {
        self.separate();
        write_quoted(&mut self.out, value);
    }

    /// Write an unsigned integer field.
    pub fn write_u32(&mut self, value: u32) {
        self.separate();
        self.out.push_str(&value.to_string());
    }

    /// Enter the signature of `method`.
    pub fn push_method(&mut self, method: EntityId) {
        self.method_context.push(method);
    }

    /// Leave the innermost method signature.
    pub fn pop_method(&mut self) {
        self.method_context.pop();
    }

    /// Finish the key.
    pub fn finish(self) -> SymbolKey {
        SymbolKey::from_encoded(self.out)
    }

    fn method_type_parameter_ordinal(&self, entity: &Entity) -> Option<u32> {
        if entity.kind != EntityKind::TypeParameter {
            return None;
        }
        let owner = entity.container?;
        (self.method_context.last() == Some(&owner)).then_some(entity.ordinal)
    }

    /// Fields are separated by one space, except directly after the header or
    /// an opening bracket.
    fn separate(&mut self) {
        match self.out.chars().last() {
            None | Some(':') | Some(ARRAY_OPEN) => {}
            Some(_) => self.out.push(FIELD_SEPARATOR),
        }
    }
}
