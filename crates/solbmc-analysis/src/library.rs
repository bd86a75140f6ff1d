//! Pipeline stage 9 (spec §2): the library summary.
//!
//! Partitions the call graph's executed code by enclosing library contract,
//! and includes only libraries whose functions are actually called.
//! Grounded verbatim on `Library`/`LibrarySummary` in the reference tool's
//! `analysis/Library.cpp`.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, ContractKind, FunctionDef};

use crate::call_graph::CallGraph;

/// One library contract, restricted to the subset of its functions the
/// bundle actually calls, in call-graph discovery order.
#[derive(Debug, Clone)]
pub struct Library<'ast> {
    pub source: &'ast ContractDef,
    functions: Vec<&'ast FunctionDef>,
}

impl<'ast> Library<'ast> {
    pub fn functions(&self) -> &[&'ast FunctionDef] {
        &self.functions
    }
}

/// The set of libraries reachable from a call graph.
#[derive(Debug, Default)]
pub struct LibrarySummary<'ast> {
    libraries: Vec<Library<'ast>>,
}

impl<'ast> LibrarySummary<'ast> {
    pub fn view(&self) -> &[Library<'ast>] {
        &self.libraries
    }
}

/// Builds the library summary by scanning `graph`'s executed code for
/// functions whose owning contract (looked up in `all_contracts`) is a
/// library. A library with no called functions never appears in the
/// result, matching the reference tool's map-then-collect shape.
pub fn build<'ast>(
    graph: &CallGraph<'ast>,
    all_contracts: &IndexMap<&str, &'ast ContractDef>,
) -> LibrarySummary<'ast> {
    let mut by_library: IndexMap<&str, Vec<&'ast FunctionDef>> = IndexMap::new();

    for (owner, func) in graph.executed_with_owner() {
        let Some(&contract) = all_contracts.get(owner) else { continue };
        if contract.kind != ContractKind::Library {
            continue;
        }
        by_library.entry(owner).or_default().push(func);
    }

    let libraries = by_library
        .into_iter()
        .map(|(name, functions)| Library { source: all_contracts[name], functions })
        .collect();

    LibrarySummary { libraries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_graph;
    use crate::expr_analysis::build_specialization_map;
    use crate::flat_contract::flatten;
    use solbmc_ast::{ContractItem, Expr, FunctionKind, Stmt, Visibility};

    fn public_fn(name: &str, body: Stmt) -> FunctionDef {
        FunctionDef {
            kind: FunctionKind::Function,
            name: Some(name.into()),
            visibility: Visibility::Public,
            params: vec![],
            returns: vec![],
            modifiers: vec![],
            body: Some(body),
            super_function: None,
        }
    }

    fn lib_call(lib: &str, member: &str) -> Stmt {
        Stmt::Expr(Expr::Call {
            callee: Box::new(Expr::Member { base: Box::new(Expr::Ident(lib.into())), member: member.into() }),
            args: vec![],
        })
    }

    #[test]
    fn summary_includes_only_called_libraries_and_functions() {
        let lib = ContractDef {
            name: "Lib".into(),
            kind: ContractKind::Library,
            bases: vec![],
            body: vec![
                ContractItem::Function(public_fn("f", Stmt::Block(vec![]))),
                ContractItem::Function(public_fn("g", Stmt::Block(vec![]))),
                ContractItem::Function(public_fn("h", Stmt::Block(vec![]))),
            ],
        };
        let unused_lib = ContractDef {
            name: "Unused".into(),
            kind: ContractKind::Library,
            bases: vec![],
            body: vec![ContractItem::Function(public_fn("z", Stmt::Block(vec![])))],
        };
        let a = ContractDef {
            name: "A".into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![ContractItem::Function(public_fn(
                "entry",
                Stmt::Block(vec![lib_call("Lib", "f"), lib_call("Lib", "g")]),
            ))],
        };
        let all: IndexMap<&str, &ContractDef> =
            [("A", &a), ("Lib", &lib), ("Unused", &unused_lib)].into_iter().collect();
        let flat_a = flatten(&[&a]);
        let spec_map = build_specialization_map(&[&a, &lib, &unused_lib]).unwrap();
        let graph = call_graph::build(&[flat_a], &all, &spec_map);

        let summary = build(&graph, &all);
        assert_eq!(summary.view().len(), 1);
        let lib_entry = &summary.view()[0];
        assert_eq!(lib_entry.source.name, "Lib");
        let names: Vec<_> = lib_entry.functions().iter().map(|f| f.dispatch_name()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"f"));
        assert!(names.contains(&"g"));
        assert!(!names.contains(&"h"));
    }
}
