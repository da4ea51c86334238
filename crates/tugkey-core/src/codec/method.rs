//! Method keys: `(M type "name" arity [parameter-types])`.
//!
//! Overloads are told apart by their parameter types, each written as a full
//! key. A parameter whose type is one of the method's own type parameters is
//! written `(! ordinal)` (see [`method_type_parameter`](super::method_type_parameter)).
//!
//! Decoding reads the signature once with no candidate method (the outline).
//! If the outline contained no ordinal references, its resolved types are
//! compared against every same-named candidate directly. Otherwise the
//! signature is re-read once per candidate with that candidate pushed, so the
//! ordinal references resolve to the candidate's own type parameters.
//!
//! Matching is exact: every parameter type must be among the candidates
//! resolved for its position. There is no fallback to partial matches.

use super::{parameter_types, signature_matches, KeyCodec};
use crate::candidates::CandidateSet;
use crate::error::{EncodingError, MalformedKeyError};
use crate::graph::{children_of_kind, parameters, Entity, EntityKind};
use crate::reader::KeyReader;
use crate::writer::KeyWriter;

pub const CODEC: KeyCodec = KeyCodec {
    kind: EntityKind::Method,
    discriminant: 'M',
    encode,
    decode,
};

fn encode(entity: &Entity, writer: &mut KeyWriter<'_>) -> Result<(), EncodingError> {
    writer.write_container(entity)?;
    writer.write_string(&entity.name);
    writer.write_u32(entity.arity);

    let signature = parameter_types(writer.graph(), entity)?;
    writer.push_method(entity.id);
    let result = writer.write_key_array(&signature);
    writer.pop_method();
    result
}

fn decode(reader: &mut KeyReader<'_>) -> Result<CandidateSet, MalformedKeyError> {
    let types = reader.read_key()?;
    let name = reader.read_string()?;
    let arity = reader.read_u32()?;

    let signature_start = reader.position();
    reader.push_outline();
    let outline = reader.read_key_array();
    let needs_context = reader.pop_method() > 0;
    let outline = outline?;
    let signature_end = reader.position();

    if types.is_empty() {
        return Ok(CandidateSet::empty());
    }

    let graph = reader.graph();
    let mut matches = reader.pool().checkout();
    for scope in &types {
        for method in children_of_kind(graph, scope, EntityKind::Method) {
            if method.name != name || method.arity != arity {
                continue;
            }
            let params = parameters(graph, method.id);
            if params.len() != outline.len() {
                continue;
            }

            let matched = if needs_context {
                reader.seek(signature_start);
                reader.push_method(method.id);
                let signature = reader.read_key_array();
                reader.pop_method();
                signature_matches(&params, &signature?)
            } else {
                signature_matches(&params, &outline)
            };
            if matched {
                matches.push_unique(method.id);
            }
        }
    }

    reader.seek(signature_end);
    Ok(CandidateSet::from_candidates(&matches))
}

#[cfg(test)]
mod tests {
    use crate::api::{encode, resolve};
    use crate::graph::{EntityId, SymbolGraph};

    struct Fixture {
        graph: SymbolGraph,
        int: EntityId,
        text: EntityId,
        ty: EntityId,
    }

    fn fixture() -> Fixture {
        let mut graph = SymbolGraph::new();
        let ns = graph.add_namespace(None, "System");
        let int = graph.add_type(ns, "Int32", 0);
        let text = graph.add_type(ns, "String", 0);
        let ty = graph.add_type(ns, "Console", 0);
        Fixture {
            graph,
            int,
            text,
            ty,
        }
    }

    mod overload_tests {
        use super::*;

        #[test]
        fn overloads_resolve_exactly() {
            let mut f = fixture();
            let none = f.graph.add_method(f.ty, "Write", 0);
            let by_int = f.graph.add_method(f.ty, "Write", 0);
            f.graph.add_parameter(by_int, "value", f.int);
            let by_text = f.graph.add_method(f.ty, "Write", 0);
            f.graph.add_parameter(by_text, "value", f.text);
            let pair = f.graph.add_method(f.ty, "Write", 0);
            f.graph.add_parameter(pair, "a", f.text);
            f.graph.add_parameter(pair, "b", f.int);

            for method in [none, by_int, by_text, pair] {
                let key = encode(&f.graph, method).unwrap();
                assert_eq!(resolve(&key, &f.graph).exact(), Ok(method), "{}", key);
            }
            assert_eq!(
                encode(&f.graph, by_int).unwrap().as_str(),
                r#"v1:(M (T (N _ "System") "Console" 0) "Write" 0 [(T (N _ "System") "Int32" 0)])"#
            );
        }

        #[test]
        fn changed_parameter_type_no_longer_matches() {
            let mut f = fixture();
            let method = f.graph.add_method(f.ty, "Write", 0);
            let param = f.graph.add_parameter(method, "value", f.int);
            let key = encode(&f.graph, method).unwrap();

            let mut edited = f.graph.clone();
            edited.remove(param);
            edited.add_parameter(method, "value", f.text);
            assert!(resolve(&key, &edited).is_empty());
        }

        #[test]
        fn parameter_names_are_not_part_of_the_key() {
            let mut f = fixture();
            let method = f.graph.add_method(f.ty, "Write", 0);
            let param = f.graph.add_parameter(method, "value", f.int);
            let key = encode(&f.graph, method).unwrap();

            f.graph.rename(param, "renamed");
            assert_eq!(resolve(&key, &f.graph).exact(), Ok(method));
        }
    }

    mod generic_tests {
        use super::*;

        #[test]
        fn generic_overloads_resolve_through_ordinals() {
            let mut f = fixture();
            let plain = f.graph.add_method(f.ty, "Echo", 1);
            let t = f.graph.add_type_parameter(plain, "T");
            f.graph.add_parameter(plain, "value", t);

            let array = f.graph.add_method(f.ty, "Echo", 1);
            let u = f.graph.add_type_parameter(array, "T");
            let u_array = f.graph.add_array_type(u, 1);
            f.graph.add_parameter(array, "values", u_array);

            let plain_key = encode(&f.graph, plain).unwrap();
            let array_key = encode(&f.graph, array).unwrap();
            assert!(plain_key.as_str().ends_with(r#""Echo" 1 [(! 0)])"#));
            assert!(array_key.as_str().ends_with(r#""Echo" 1 [(Y (! 0) 1)])"#));

            assert_eq!(resolve(&plain_key, &f.graph).exact(), Ok(plain));
            assert_eq!(resolve(&array_key, &f.graph).exact(), Ok(array));
        }

        #[test]
        fn type_level_parameters_are_written_in_full() {
            let mut f = fixture();
            let list = f.graph.add_type(f.ty, "Box", 1);
            let t = f.graph.add_type_parameter(list, "T");
            let set = f.graph.add_method(list, "Set", 0);
            f.graph.add_parameter(set, "value", t);

            let key = encode(&f.graph, set).unwrap();
            assert!(key.as_str().contains(r#"[(G (T"#));
            assert_eq!(resolve(&key, &f.graph).exact(), Ok(set));
        }

        #[test]
        fn arity_is_part_of_the_key() {
            let mut f = fixture();
            let plain = f.graph.add_method(f.ty, "Create", 0);
            let generic = f.graph.add_method(f.ty, "Create", 1);
            f.graph.add_type_parameter(generic, "T");

            assert_eq!(
                resolve(&encode(&f.graph, plain).unwrap(), &f.graph).exact(),
                Ok(plain)
            );
            assert_eq!(
                resolve(&encode(&f.graph, generic).unwrap(), &f.graph).exact(),
                Ok(generic)
            );
        }
    }

    mod nesting_tests {
        use super::*;
        use crate::pool::BufferPool;
        use crate::reader::KeyReader;

        /// `F<T>(T)` declared `count` times on one type.
        fn generic_overloads(count: usize) -> SymbolGraph {
            let mut f = fixture();
            for _ in 0..count {
                let method = f.graph.add_method(f.ty, "F", 1);
                let t = f.graph.add_type_parameter(method, "T");
                f.graph.add_parameter(method, "value", t);
            }
            f.graph
        }

        /// A method key whose parameter is a type parameter of another method
        /// key, nested `levels` deep.
        fn nested_key(levels: usize) -> String {
            let owner = r#"(T (N _ "System") "Console" 0)"#;
            let mut segment = format!(r#"(M {} "F" 1 [(! 0)])"#, owner);
            for _ in 1..levels {
                segment = format!(r#"(M {} "F" 1 [(G {} "T")])"#, owner, segment);
            }
            format!("v1:{}", segment)
        }

        #[test]
        fn nested_references_do_not_force_rereads() {
            let graph = generic_overloads(10);
            let pool = BufferPool::default();

            let mut decoded = Vec::new();
            for levels in 1..=6 {
                let key = nested_key(levels);
                let mut reader = KeyReader::new(&key, &graph, &pool, 256);
                let candidates = reader.read_root().unwrap();
                assert_eq!(candidates.len(), 10, "{}", key);
                decoded.push(reader.segments_decoded());
            }

            // One outline pass plus ten re-reads for the innermost method,
            // then a fixed number of segments per enclosing level.
            let step = decoded[1] - decoded[0];
            for pair in decoded.windows(2) {
                assert_eq!(pair[1] - pair[0], step, "{:?}", decoded);
            }
            assert!(decoded[5] < 100, "{:?}", decoded);
        }

        #[test]
        fn own_references_still_reread_per_candidate() {
            let graph = generic_overloads(3);
            let pool = BufferPool::default();
            let key = nested_key(1);

            let mut reader = KeyReader::new(&key, &graph, &pool, 256);
            assert_eq!(reader.read_root().unwrap().len(), 3);
            // M, T, N, the outline's `!`, and one `!` per candidate.
            assert_eq!(reader.segments_decoded(), 7);
        }
    }
}
