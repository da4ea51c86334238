//! Parameter keys: `(P owner "name")`.

use super::{collect_children, KeyCodec};
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::Parameter,
    discriminant: 'P',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_container(entity)?;
    writer.write_string(&entity.name);
    Ok(())
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let owners = reader.read_key()?;
    let name = reader.read_string()?;

    if owners.is_empty() {
        return Ok(CandidateSet::empty());
    }
    Ok(collect_children(
        reader,
        &owners,
        EntityKind::Parameter,
        |param| param.name == name,
    ))
}
