//! Stage 4: the contract-return / expression analyser (spec §4.4 prelude).
//!
//! Determines, for an expression whose static type is a contract, which
//! concrete deployed contract it refers to — the same specialisation
//! question [`crate::alloc_graph`] answers for state-variable fields,
//! generalised to arbitrary identifier and member-access chains so the
//! call graph builder can resolve virtual dispatch.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, Expr, Type};

use crate::alloc_graph::specialise;
use crate::error::InvariantViolation;

/// Maps `(owner contract, field name) -> concrete contract name` for every
/// contract-typed state variable across the whole contract pool (not just
/// the bundle), since a call may dispatch through an unbundled
/// intermediate contract's field.
#[derive(Debug, Default)]
pub struct SpecializationMap {
    by_owner_field: IndexMap<(String, String), String>,
}

impl SpecializationMap {
    pub fn get(&self, owner: &str, field: &str) -> Option<&str> {
        self.by_owner_field.get(&(owner.to_string(), field.to_string())).map(String::as_str)
    }
}

/// Builds the specialisation map for every contract in `contracts`.
pub fn build_specialization_map(
    contracts: &[&ContractDef],
) -> Result<SpecializationMap, InvariantViolation> {
    let mut by_owner_field = IndexMap::new();
    for contract in contracts {
        for var in contract.state_vars() {
            if !matches!(var.ty, Type::Custom(_)) {
                continue;
            }
            let target = specialise(contract, var)?;
            if !target.is_empty() {
                by_owner_field.insert((contract.name.clone(), var.name.clone()), target);
            }
        }
    }
    Ok(SpecializationMap { by_owner_field })
}

/// Resolves the concrete contract an expression of contract type refers
/// to, given the name of the contract lexically enclosing `expr`.
///
/// Handles three shapes: a direct `new T(...)`, a bare identifier that
/// names a specialised field (or `this`, which always resolves to
/// `owner`), and a member-access chain that walks through nested
/// specialised fields one hop at a time. Anything else (the result of an
/// arbitrary function call, a ternary, ...) is not resolvable by this
/// analysis and yields `None`; the call graph builder then has to fall
/// back to treating the call as unresolved (and, conservatively, as
/// reaching every override candidate — see [`crate::call_graph`]).
pub fn resolve_contract_expr(map: &SpecializationMap, owner: &str, expr: &Expr) -> Option<String> {
    match expr {
        Expr::New { ty: Type::Custom(name), .. } => Some(name.clone()),
        Expr::Ident(name) if name == "this" => Some(owner.to_string()),
        Expr::Ident(name) => map.get(owner, name).map(str::to_string),
        Expr::Member { base, member } => {
            let base_contract = resolve_contract_expr(map, owner, base)?;
            map.get(&base_contract, member).map(str::to_string)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbmc_ast::{ContractItem, ContractKind, StateVarDef};

    #[test]
    fn resolves_this_and_new_and_fields() {
        let child = ContractDef {
            name: "Owner".into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![ContractItem::StateVar(StateVarDef {
                name: "other".into(),
                ty: Type::Custom("Concrete".into()),
                initializer: Some(Expr::New { ty: Type::Custom("Concrete".into()), args: vec![] }),
            })],
        };
        let map = build_specialization_map(&[&child]).unwrap();
        assert_eq!(
            resolve_contract_expr(&map, "Owner", &Expr::Ident("this".into())),
            Some("Owner".to_string())
        );
        assert_eq!(
            resolve_contract_expr(&map, "Owner", &Expr::Ident("other".into())),
            Some("Concrete".to_string())
        );
        assert_eq!(
            resolve_contract_expr(&map, "Owner", &Expr::New { ty: Type::Custom("X".into()), args: vec![] }),
            Some("X".to_string())
        );
    }
}
