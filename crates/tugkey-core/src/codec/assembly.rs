//! Assembly keys: `(A "name")`.
//!
//! Assemblies are roots, so their key is the name alone.

use super::KeyCodec;
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{roots_of_kind, Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::Assembly,
    discriminant: 'A',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_string(&entity.name);
    Ok(())
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let name = reader.read_string()?;

    let mut matches = reader.pool().checkout();
    for assembly in roots_of_kind(reader.graph(), EntityKind::Assembly) {
        if assembly.name == name {
            matches.push_unique(assembly.id);
        }
    }
    Ok(CandidateSet::from_candidates(&matches))
}
