//! Stage 5: the call graph builder (spec §4.4).
//!
//! Worklist/fixpoint over direct calls, modifier applications, library
//! calls, and `super`-chain resolution, rooted at each bundled contract's
//! flat interface, its constructor, and its fallback. Grounded on the
//! `Context`-driven resolution style of `sol-macro/src/expand/mod.rs`,
//! generalised from a single-contract expansion to a closed reachability
//! set over many.

use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use solbmc_ast::{ContractDef, ContractKind, Expr, FunctionDef};

use crate::expr_analysis::{resolve_contract_expr, SpecializationMap};
use crate::flat_contract::FlatContract;
use crate::walk::visit_stmt_exprs;

/// A function or modifier identified by its enclosing contract and its
/// dispatch name. Flat-interface collision resolution (§4.3) already
/// guarantees this pair is unique within a bundled contract's own
/// methods; modifiers are looked up directly on the source contract and
/// are assumed non-overloadable, matching the source language's rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionId {
    pub owner: String,
    pub name: String,
}

/// The closed reachability set computed from the bundle's entry points.
#[derive(Debug, Default)]
pub struct CallGraph<'ast> {
    executed: IndexMap<FunctionId, &'ast FunctionDef>,
    modifiers: IndexMap<FunctionId, &'ast FunctionDef>,
}

impl<'ast> CallGraph<'ast> {
    pub fn executed_code(&self) -> impl Iterator<Item = &'ast FunctionDef> + '_ {
        self.executed.values().copied()
    }

    /// Like [`Self::executed_code`], but paired with the name of the
    /// contract each function was reached through. Used by
    /// [`crate::library`] to partition reachable code by enclosing library.
    pub fn executed_with_owner(&self) -> impl Iterator<Item = (&str, &'ast FunctionDef)> + '_ {
        self.executed.iter().map(|(id, f)| (id.owner.as_str(), *f))
    }

    pub fn applied_modifiers(&self) -> impl Iterator<Item = &'ast FunctionDef> + '_ {
        self.modifiers.values().copied()
    }

    pub fn contains(&self, id: &FunctionId) -> bool {
        self.executed.contains_key(id)
    }

    /// The ordered chain of overridden functions reachable from `f` via
    /// its `super_function` annotation, starting with `f` itself.
    pub fn superchain_for(f: &'ast FunctionDef) -> Vec<&'ast FunctionDef> {
        let mut chain = vec![f];
        let mut cur = f;
        while let Some(next) = &cur.super_function {
            chain.push(next);
            cur = next;
        }
        chain
    }
}

fn find_modifier<'ast>(contract: &'ast ContractDef, name: &str) -> Option<&'ast FunctionDef> {
    contract.functions().find(|f| {
        f.kind == solbmc_ast::FunctionKind::Modifier && f.name.as_deref() == Some(name)
    })
}

fn find_library_function<'ast>(
    libraries: &IndexMap<&str, &'ast ContractDef>,
    lib_name: &str,
    fn_name: &str,
) -> Option<&'ast FunctionDef> {
    libraries.get(lib_name).and_then(|lib| {
        lib.functions().find(|f| f.dispatch_name() == fn_name && f.is_public_entry())
    })
}

/// Builds the call graph reachable from `bundle`'s entry points.
///
/// `all_contracts` must include every contract, library, and interface in
/// the loaded source units (not just the bundle) so that library calls
/// and cross-contract field dispatch can be resolved; `spec_map` is the
/// specialisation map built by [`crate::expr_analysis`].
pub fn build<'ast>(
    bundle: &[FlatContract<'ast>],
    all_contracts: &IndexMap<&str, &'ast ContractDef>,
    spec_map: &SpecializationMap,
) -> CallGraph<'ast> {
    let mut executed: IndexMap<FunctionId, &'ast FunctionDef> = IndexMap::new();
    let mut modifiers: IndexMap<FunctionId, &'ast FunctionDef> = IndexMap::new();
    let mut queue: VecDeque<(String, &'ast FunctionDef)> = VecDeque::new();
    let mut seen: IndexSet<FunctionId> = IndexSet::new();

    let libraries: IndexMap<&str, &'ast ContractDef> = all_contracts
        .iter()
        .filter(|(_, c)| c.kind == ContractKind::Library)
        .map(|(&k, &v)| (k, v))
        .collect();

    for flat in bundle {
        for m in flat.methods() {
            queue.push_back((flat.source.name.clone(), m));
        }
        if let Some(ctor) = flat.source.constructor() {
            queue.push_back((flat.source.name.clone(), ctor));
        }
        if let Some(fb) = flat.source.fallback() {
            queue.push_back((flat.source.name.clone(), fb));
        }
    }

    let flat_by_name: IndexMap<&str, &FlatContract<'ast>> =
        bundle.iter().map(|f| (f.source.name.as_str(), f)).collect();

    while let Some((owner, func)) = queue.pop_front() {
        let id = FunctionId { owner: owner.clone(), name: func.dispatch_name().to_string() };
        if !seen.insert(id.clone()) {
            continue;
        }
        executed.insert(id, func);

        for m in &func.modifiers {
            if let Some(contract) = all_contracts.get(owner.as_str()) {
                if let Some(modifier) = find_modifier(contract, &m.name) {
                    let mid = FunctionId { owner: owner.clone(), name: m.name.clone() };
                    if !modifiers.contains_key(&mid) {
                        modifiers.insert(mid, modifier);
                        queue.push_back((owner.clone(), modifier));
                    }
                }
            }
        }

        let Some(body) = &func.body else { continue };
        visit_stmt_exprs(body, &mut |expr| {
            let Expr::Call { callee, args } = expr else { return };
            match callee.as_ref() {
                // Internal call: `f(...)` resolved against the owner
                // contract's full declared function list (not just the
                // public flat interface), since an internal/private helper
                // is never part of a flat contract's dispatch table but
                // must still be reachable from it (spec §8 "call-graph
                // closure"). Matched by name and arity, the same precision
                // the library-call branch below uses.
                Expr::Ident(name) => {
                    if let Some(contract) = all_contracts.get(owner.as_str()) {
                        if let Some(target) =
                            contract.functions().find(|f| f.dispatch_name() == name && f.params.len() == args.len())
                        {
                            queue.push_back((owner.clone(), target));
                        }
                    }
                }
                // `super.f(...)`: handled by the scope resolver rejecting bare
                // `super`; a qualified super call instead resolves through
                // the callee function's own `super_function` chain.
                Expr::Member { base, member } if base.as_ref() == &Expr::Ident("super".into()) => {
                    if let Some(parent) = &func.super_function {
                        if parent.dispatch_name() == member {
                            queue.push_back((owner.clone(), parent));
                        }
                    }
                }
                Expr::Member { base, member } => {
                    if let Expr::Ident(base_name) = base.as_ref() {
                        if let Some(target) = find_library_function(&libraries, base_name, member) {
                            queue.push_back((base_name.clone(), target));
                            return;
                        }
                    }
                    if let Some(target_contract) = resolve_contract_expr(spec_map, &owner, base) {
                        if let Some(flat) = flat_by_name.get(target_contract.as_str()) {
                            if let Some(target) = flat.methods().iter().find(|m| m.dispatch_name() == member) {
                                queue.push_back((target_contract, target));
                            }
                        }
                    }
                }
                _ => {}
            }
        });
    }

    CallGraph { executed, modifiers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_contract::flatten;
    use solbmc_ast::{ContractItem, FunctionKind, Stmt, Visibility};

    fn call(name: &str) -> Expr {
        Expr::Call { callee: Box::new(Expr::Ident(name.into())), args: vec![] }
    }

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

    #[test]
    fn library_summary_scenario() {
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
        let a = ContractDef {
            name: "A".into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![ContractItem::Function(public_fn(
                "entry",
                Stmt::Block(vec![
                    Stmt::Expr(Expr::Call {
                        callee: Box::new(Expr::Member {
                            base: Box::new(Expr::Ident("Lib".into())),
                            member: "f".into(),
                        }),
                        args: vec![],
                    }),
                    Stmt::Expr(Expr::Call {
                        callee: Box::new(Expr::Member {
                            base: Box::new(Expr::Ident("Lib".into())),
                            member: "g".into(),
                        }),
                        args: vec![],
                    }),
                ]),
            ))],
        };
        let all: IndexMap<&str, &ContractDef> =
            [("A", &a), ("Lib", &lib)].into_iter().collect();
        let flat_a = flatten(&[&a]);
        let spec_map = crate::expr_analysis::build_specialization_map(&[&a, &lib]).unwrap();
        let graph = build(&[flat_a], &all, &spec_map);

        let executed: Vec<_> = graph.executed_code().map(|f| f.dispatch_name().to_string()).collect();
        assert_eq!(executed.len(), 3);
        assert!(executed.contains(&"entry".to_string()));
        assert!(executed.contains(&"f".to_string()));
        assert!(executed.contains(&"g".to_string()));
        assert!(!executed.contains(&"h".to_string()));
    }

    #[test]
    fn internal_call_reaches_callee() {
        let a = ContractDef {
            name: "A".into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![
                ContractItem::Function(public_fn("entry", Stmt::Expr(call("helper")))),
                ContractItem::Function(FunctionDef {
                    kind: FunctionKind::Function,
                    name: Some("helper".into()),
                    visibility: Visibility::Internal,
                    params: vec![],
                    returns: vec![],
                    modifiers: vec![],
                    body: Some(Stmt::Block(vec![])),
                    super_function: None,
                }),
            ],
        };
        let all: IndexMap<&str, &ContractDef> = [("A", &a)].into_iter().collect();
        let flat_a = flatten(&[&a]);
        let spec_map = crate::expr_analysis::build_specialization_map(&[&a]).unwrap();
        let graph = build(&[flat_a], &all, &spec_map);
        let names: Vec<_> = graph.executed_code().map(|f| f.dispatch_name().to_string()).collect();
        assert!(names.contains(&"entry".to_string()));
        assert!(names.contains(&"helper".to_string()));
    }
}
