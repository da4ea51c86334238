//! Property keys: `(R type "name" [parameter-types])`.
//!
//! Ordinary properties have an empty parameter list; indexers list their
//! parameter types so overloaded indexers stay distinct. Properties have no
//! type parameters, so the signature is read without method context.

use super::{collect_children, parameter_types, signature_matches, KeyCodec};
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{parameters, Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::Property,
    discriminant: 'R',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_container(entity)?;
    writer.write_string(&entity.name);
    let signature = parameter_types(writer.graph(), entity)?;
    writer.write_key_array(&signature)
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let types = reader.read_key()?;
    let name = reader.read_string()?;
    let signature = reader.read_key_array()?;

    if types.is_empty() {
        return Ok(CandidateSet::empty());
    }
    let graph = reader.graph();
    Ok(collect_children(reader, &types, EntityKind::Property, |prop| {
        prop.name == name && signature_matches(&parameters(graph, prop.id), &signature)
    }))
}
