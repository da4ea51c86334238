//! Named type keys: `(T container "name" arity)`.
//!
//! The container is a namespace, or another type for nested types. Arity
//! separates generic overloads such as `List` and `List<T>`.

use super::{collect_children, KeyCodec};
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::NamedType,
    discriminant: 'T',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_container(entity)?;
    writer.write_string(&entity.name);
    writer.write_u32(entity.arity);
    Ok(())
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let containers = reader.read_key()?;
    let name = reader.read_string()?;
    let arity = reader.read_u32()?;

    if containers.is_empty() {
        return Ok(CandidateSet::empty());
    }
    Ok(collect_children(
        reader,
        &containers,
        EntityKind::NamedType,
        |ty| ty.name == name && ty.arity == arity,
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::{encode, resolve};
    use crate::graph::SymbolGraph;

    #[test]
    fn arity_distinguishes_generic_overloads() {
        let mut graph = SymbolGraph::new();
        let ns = graph.add_namespace(None, "Collections");
        let plain = graph.add_type(ns, "List", 0);
        let generic = graph.add_type(ns, "List", 1);

        let key = encode(&graph, generic).unwrap();
        assert_eq!(key.as_str(), r#"v1:(T (N _ "Collections") "List" 1)"#);
        assert_eq!(resolve(&key, &graph).exact(), Ok(generic));
        assert_eq!(
            resolve(&encode(&graph, plain).unwrap(), &graph).exact(),
            Ok(plain)
        );
    }

    #[test]
    fn nested_types_use_the_outer_type_as_container() {
        let mut graph = SymbolGraph::new();
        let ns = graph.add_namespace(None, "N");
        let outer = graph.add_type(ns, "Outer", 0);
        let inner = graph.add_type(outer, "Inner", 0);

        let key = encode(&graph, inner).unwrap();
        assert_eq!(
            key.as_str(),
            r#"v1:(T (T (N _ "N") "Outer" 0) "Inner" 0)"#
        );
        assert_eq!(resolve(&key, &graph).exact(), Ok(inner));
    }
}
