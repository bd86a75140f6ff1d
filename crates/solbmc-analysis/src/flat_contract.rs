//! Stage 3: the flat contract builder (spec §4.3).
//!
//! Grounded verbatim on `FlatContract` in the reference tool's
//! `analysis/Inheritance.cpp`: walk the frontend-provided linearization
//! most-derived first, registering each public implemented method unless
//! it collides with one already registered for that name, and merging
//! state variables first-occurrence-wins.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, FunctionDef, StateVarDef, Type};

use crate::types::unwrap;

/// Structural type equivalence used by the collision predicate: width- and
/// signedness-sensitive for scalars, name-sensitive for everything else
/// (so two distinct structs, or a struct and a contract, never collide
/// even if one day they share a representation).
fn types_equivalent(a: &Type, b: &Type) -> bool {
    match (unwrap(a), unwrap(b)) {
        (Type::Address { .. }, Type::Address { .. }) => true,
        (Type::Bool, Type::Bool) => true,
        (Type::String, Type::String) => true,
        (Type::Bytes, Type::Bytes) => true,
        (Type::FixedBytes(n1), Type::FixedBytes(n2)) => n1 == n2,
        (Type::Int(w1), Type::Int(w2)) => w1 == w2,
        (Type::Uint(w1), Type::Uint(w2)) => w1 == w2,
        (Type::Array { element: e1, len: l1 }, Type::Array { element: e2, len: l2 }) => {
            l1 == l2 && types_equivalent(&e1, &e2)
        }
        (Type::Tuple(t1), Type::Tuple(t2)) => {
            t1.len() == t2.len() && t1.iter().zip(t2.iter()).all(|(x, y)| types_equivalent(x, y))
        }
        (Type::Mapping { key: k1, value: v1 }, Type::Mapping { key: k2, value: v2 }) => {
            types_equivalent(&k1, &k2) && types_equivalent(&v1, &v2)
        }
        (Type::Custom(n1), Type::Custom(n2)) => n1 == n2,
        (Type::Modifier, Type::Modifier) => true,
        (Type::Magic(m1), Type::Magic(m2)) => m1 == m2,
        (Type::Construction(n1), Type::Construction(n2)) => n1 == n2,
        _ => false,
    }
}

/// Two methods collide iff they share a name and have positionally
/// equivalent parameter types (spec §3 `SignatureCollision`). Return type
/// plays no role: Solidity does not allow overloading on return type
/// alone, so it cannot disambiguate a collision either.
pub fn collide(a: &FunctionDef, b: &FunctionDef) -> bool {
    if a.dispatch_name() != b.dispatch_name() {
        return false;
    }
    if a.params.len() != b.params.len() {
        return false;
    }
    a.params.iter().zip(b.params.iter()).all(|(pa, pb)| types_equivalent(&pa.ty, &pb.ty))
}

/// A contract's concrete, inheritance-resolved interface: its dispatch
/// table and its storage layout.
#[derive(Debug, Clone)]
pub struct FlatContract<'ast> {
    pub source: &'ast ContractDef,
    methods: Vec<&'ast FunctionDef>,
    state_vars: Vec<&'ast StateVarDef>,
}

impl<'ast> FlatContract<'ast> {
    pub fn methods(&self) -> &[&'ast FunctionDef] {
        &self.methods
    }

    pub fn state_vars(&self) -> &[&'ast StateVarDef] {
        &self.state_vars
    }

    /// Looks up a method in the flat interface by name and arity-matching
    /// parameter list, as used to resolve a direct internal call.
    pub fn find_method(&self, name: &str, arg_types: &[Type]) -> Option<&'ast FunctionDef> {
        self.methods.iter().copied().find(|m| {
            m.dispatch_name() == name
                && m.params.len() == arg_types.len()
                && m.params.iter().zip(arg_types).all(|(p, t)| types_equivalent(&p.ty, t))
        })
    }
}

/// Builds the flat contract for `contract`, given its linearized base list
/// resolved to definitions in `linearization` (most-derived first,
/// matching the frontend's `bases` order with `contract` itself prepended
/// by the caller if it is not already base 0 of its own linearization).
pub fn flatten<'ast>(linearization: &[&'ast ContractDef]) -> FlatContract<'ast> {
    let mut methods: Vec<&'ast FunctionDef> = Vec::new();
    let mut state_vars: Vec<&'ast StateVarDef> = Vec::new();
    let mut seen_var_names: Vec<&str> = Vec::new();

    for base in linearization {
        use solbmc_ast::ContractKind;
        if base.kind == ContractKind::Interface {
            continue;
        }
        for f in base.functions() {
            if !f.is_public_entry() {
                continue;
            }
            if methods.iter().any(|existing| collide(existing, f)) {
                continue;
            }
            methods.push(f);
        }
        for v in base.state_vars() {
            if !seen_var_names.contains(&v.name.as_str()) {
                seen_var_names.push(&v.name);
                state_vars.push(v);
            }
        }
    }

    FlatContract { source: linearization[0], methods, state_vars }
}

/// Resolves `contract`'s own linearization: itself, followed by each name
/// in `contract.bases` looked up in `all_contracts` (already most-derived
/// first, since the frontend never hands this crate an unordered base
/// list). A base name absent from `all_contracts` is silently skipped
/// rather than treated as an error here; an absent base is either an
/// interface (filtered out inside [`flatten`]) or a bundle-resolution
/// problem the bundle extractor already reported.
pub fn resolve_linearization<'ast>(
    contract: &'ast ContractDef,
    all_contracts: &IndexMap<&str, &'ast ContractDef>,
) -> Vec<&'ast ContractDef> {
    let mut chain = vec![contract];
    for base in &contract.bases {
        if let Some(&def) = all_contracts.get(base.as_str()) {
            chain.push(def);
        }
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbmc_ast::{ContractItem, ContractKind, FunctionKind, Param, Visibility};

    fn func(name: &str, params: Vec<Type>) -> FunctionDef {
        FunctionDef {
            kind: FunctionKind::Function,
            name: Some(name.into()),
            visibility: Visibility::Public,
            params: params.into_iter().map(|ty| Param { name: None, ty }).collect(),
            returns: vec![],
            modifiers: vec![],
            body: Some(solbmc_ast::Stmt::Block(vec![])),
            super_function: None,
        }
    }

    fn contract(name: &str, funcs: Vec<FunctionDef>) -> ContractDef {
        ContractDef {
            name: name.into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: funcs.into_iter().map(ContractItem::Function).collect(),
        }
    }

    #[test]
    fn function_collision_matches_reference_scenario() {
        // contract A { f(int,uint); f(int); f(); g(); }
        // contract B { f(int,uint); f(int); f(); g(); }
        let sigs: Vec<Vec<Type>> = vec![
            vec![Type::Int(Some(256)), Type::Uint(Some(256))],
            vec![Type::Int(Some(256))],
            vec![],
        ];
        let a_funcs: Vec<FunctionDef> =
            sigs.iter().cloned().map(|p| func("f", p)).chain(std::iter::once(func("g", vec![]))).collect();
        let b_funcs: Vec<FunctionDef> =
            sigs.iter().cloned().map(|p| func("f", p)).chain(std::iter::once(func("g", vec![]))).collect();

        for i in 0..4 {
            assert!(collide(&a_funcs[i], &a_funcs[i]));
            assert!(collide(&a_funcs[i], &b_funcs[i]));
            assert!(collide(&b_funcs[i], &b_funcs[i]));
            for j in 0..4 {
                if i != j {
                    assert!(!collide(&a_funcs[i], &b_funcs[j]));
                }
            }
        }
        // sanity: contracts built as the reference test does, unused otherwise
        let _a = contract("A", a_funcs);
        let _b = contract("B", b_funcs);
    }

    #[test]
    fn override_wins_over_base_when_most_derived_first() {
        let base = contract("Base", vec![func("f", vec![])]);
        let mut derived_f = func("f", vec![]);
        derived_f.modifiers.push(solbmc_ast::ModifierInvocation { name: "derived_marker".into(), args: vec![] });
        let derived = contract("Derived", vec![derived_f]);

        let flat = flatten(&[&derived, &base]);
        assert_eq!(flat.methods().len(), 1);
        assert_eq!(flat.methods()[0].modifiers.len(), 1);
        assert_eq!(flat.methods()[0].modifiers[0].name, "derived_marker");
    }

    #[test]
    fn state_variables_first_occurrence_wins() {
        let base = contract(
            "Base",
            vec![],
        );
        let mut base = base;
        base.body.push(ContractItem::StateVar(StateVarDef {
            name: "x".into(),
            ty: Type::Uint(Some(8)),
            initializer: None,
        }));
        let mut derived = contract("Derived", vec![]);
        derived.body.push(ContractItem::StateVar(StateVarDef {
            name: "x".into(),
            ty: Type::Uint(Some(256)),
            initializer: None,
        }));
        let flat = flatten(&[&derived, &base]);
        assert_eq!(flat.state_vars().len(), 1);
        assert_eq!(flat.state_vars()[0].ty, Type::Uint(Some(256)));
    }

    #[test]
    fn resolve_linearization_follows_bases_in_order() {
        let base = contract("Base", vec![]);
        let mut derived = contract("Derived", vec![]);
        derived.bases.push("Base".into());
        let all: IndexMap<&str, &ContractDef> = [("Base", &base), ("Derived", &derived)].into_iter().collect();
        let chain = resolve_linearization(&derived, &all);
        let names: Vec<_> = chain.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Derived", "Base"]);
    }

    #[test]
    fn interface_only_base_yields_empty_flat_interface() {
        let iface = ContractDef {
            name: "IFoo".into(),
            kind: ContractKind::Interface,
            bases: vec![],
            body: vec![ContractItem::Function(func("f", vec![]))],
        };
        let mut derived = contract("Derived", vec![]);
        derived.bases.push("IFoo".into());
        let all: IndexMap<&str, &ContractDef> = [("IFoo", &iface), ("Derived", &derived)].into_iter().collect();
        let chain = resolve_linearization(&derived, &all);
        let flat = flatten(&chain);
        assert!(flat.methods().is_empty());
    }
}
