//! Shared fixtures for tugkey-core integration tests.
//!
//! [`Library::build`] creates a small class library. The `edited` variant
//! builds the same library after identity-preserving edits: an unrelated
//! assembly is added first (shifting every entity id) and a new overload,
//! type, and field are interleaved with the original declarations.

#![allow(dead_code)]

use tugkey_core::{EntityId, EntityKind, SemanticGraph, SymbolGraph};

/// Named entities of the fixture library.
pub struct Library {
    pub graph: SymbolGraph,
    pub core: EntityId,
    pub core_main: EntityId,
    pub core_extra: EntityId,
    pub global: EntityId,
    pub extra_global: EntityId,
    pub system: EntityId,
    pub collections: EntityId,
    pub int32: EntityId,
    pub string: EntityId,
    pub console: EntityId,
    pub write_int: EntityId,
    pub write_string: EntityId,
    pub write_value: EntityId,
    pub write_value_t: EntityId,
    pub list: EntityId,
    pub list_t: EntityId,
    pub list_add: EntityId,
    pub list_add_item: EntityId,
    pub list_items: EntityId,
    pub list_count: EntityId,
    pub list_indexer: EntityId,
    pub list_convert: EntityId,
    pub list_convert_out: EntityId,
    pub enumerator: EntityId,
    pub string_array: EntityId,
    pub local: EntityId,
}

impl Library {
    pub fn build(edited: bool) -> Library {
        let mut graph = SymbolGraph::new();
        if edited {
            let padding = graph.add_assembly("Padding");
            graph.add_module(padding, "Padding.dll");
        }

        let core = graph.add_assembly("Core");
        let core_main = graph.add_module(core, "Core.dll");
        let core_extra = graph.add_module(core, "Core.Extra.dll");
        let global = graph.add_namespace(Some(core_main), "");
        let extra_global = graph.add_namespace(Some(core_extra), "");
        let system = graph.add_namespace(Some(global), "System");
        let collections = graph.add_namespace(Some(system), "Collections");

        if edited {
            graph.add_type(system, "Guid", 0);
        }
        let int32 = graph.add_type(system, "Int32", 0);
        let string = graph.add_type(system, "String", 0);
        let string_array = graph.add_array_type(string, 1);

        let console = graph.add_type(system, "Console", 0);
        if edited {
            let write_guid = graph.add_method(console, "Write", 0);
            let guid = graph.add_type(system, "Guid2", 0);
            graph.add_parameter(write_guid, "value", guid);
        }
        let write_int = graph.add_method(console, "Write", 0);
        graph.add_parameter(write_int, "value", int32);
        let write_string = graph.add_method(console, "Write", 0);
        graph.add_parameter(write_string, "value", string);
        let write_value = graph.add_method(console, "Write", 1);
        let write_value_t = graph.add_type_parameter(write_value, "T");
        graph.add_parameter(write_value, "value", write_value_t);

        let list = graph.add_type(collections, "List", 1);
        let list_t = graph.add_type_parameter(list, "T");
        let list_t_array = graph.add_array_type(list_t, 1);
        if edited {
            graph.add_field(list, "version", int32);
        }
        let list_items = graph.add_field(list, "items", list_t_array);
        let list_count = graph.add_property(list, "Count", int32);
        let list_indexer = graph.add_property(list, "Item", list_t);
        graph.add_parameter(list_indexer, "index", int32);
        let list_add = graph.add_method(list, "Add", 0);
        let list_add_item = graph.add_parameter(list_add, "item", list_t);
        let list_convert = graph.add_method(list, "ConvertAll", 1);
        let list_convert_out = graph.add_type_parameter(list_convert, "TOut");
        let out_array = graph.add_array_type(list_convert_out, 1);
        graph.add_parameter(list_convert, "buffer", out_array);
        graph.add_parameter(list_convert, "offset", int32);
        let local = graph.add_local(list_convert, "i");
        let enumerator = graph.add_type(list, "Enumerator", 0);

        Library {
            graph,
            core,
            core_main,
            core_extra,
            global,
            extra_global,
            system,
            collections,
            int32,
            string,
            console,
            write_int,
            write_string,
            write_value,
            write_value_t,
            list,
            list_t,
            list_add,
            list_add_item,
            list_items,
            list_count,
            list_indexer,
            list_convert,
            list_convert_out,
            enumerator,
            string_array,
            local,
        }
    }

    /// Entities expected to resolve exactly, with a label for assertion messages.
    pub fn exact_entities(&self) -> Vec<(&'static str, EntityId)> {
        vec![
            ("core", self.core),
            ("system", self.system),
            ("collections", self.collections),
            ("int32", self.int32),
            ("string", self.string),
            ("console", self.console),
            ("write_int", self.write_int),
            ("write_string", self.write_string),
            ("write_value", self.write_value),
            ("write_value_t", self.write_value_t),
            ("list", self.list),
            ("list_t", self.list_t),
            ("list_add", self.list_add),
            ("list_add_item", self.list_add_item),
            ("list_items", self.list_items),
            ("list_count", self.list_count),
            ("list_indexer", self.list_indexer),
            ("list_convert", self.list_convert),
            ("list_convert_out", self.list_convert_out),
            ("enumerator", self.enumerator),
            ("string_array", self.string_array),
        ]
    }
}

/// Every entity reachable from the roots, in traversal order.
pub fn reachable(graph: &dyn SemanticGraph) -> Vec<EntityId> {
    let mut seen = Vec::new();
    let mut pending: Vec<EntityId> = graph.roots().iter().rev().copied().collect();
    while let Some(id) = pending.pop() {
        seen.push(id);
        pending.extend(graph.children(id).iter().rev().copied());
    }
    seen
}

/// A graph with `types` types in one namespace, each with a field, a property,
/// and two overloaded methods with a parameter each.
pub fn wide_library(types: usize) -> SymbolGraph {
    let mut graph = SymbolGraph::new();
    let asm = graph.add_assembly("Wide");
    let module = graph.add_module(asm, "Wide.dll");
    let global = graph.add_namespace(Some(module), "");
    let ns = graph.add_namespace(Some(global), "Wide");
    let int = graph.add_type(ns, "Int", 0);

    for i in 0..types {
        let ty = graph.add_type(ns, &format!("Type{}", i), 0);
        graph.add_field(ty, "value", int);
        graph.add_property(ty, "Value", int);
        let plain = graph.add_method(ty, "Apply", 0);
        graph.add_parameter(plain, "x", int);
        let generic = graph.add_method(ty, "Apply", 1);
        let t = graph.add_type_parameter(generic, "T");
        graph.add_parameter(generic, "x", t);
    }
    graph
}

/// True for kinds the protocol can key.
pub fn is_keyed(graph: &dyn SemanticGraph, id: EntityId) -> bool {
    graph
        .entity(id)
        .is_some_and(|entity| entity.kind != EntityKind::Local)
}
