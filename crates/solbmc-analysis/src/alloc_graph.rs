//! Stage 2: the allocation graph (spec §4.2).
//!
//! Tracks, per contract, which other contracts it constructs and through
//! which field; consulted by [`crate::tight_bundle`] to unfold the bundle
//! roots into a forest of instances.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, Expr, Type};

use crate::error::InvariantViolation;
use crate::walk::visit_expr;

/// One allocation edge: `owner` constructs an instance of `target` through
/// its field `field`.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub field: String,
    pub target: String,
}

/// Maps a contract name to the contracts it allocates, in declaration
/// order, preserving duplicate fields (two fields of the same contract
/// type are two distinct allocation sites).
#[derive(Debug, Default)]
pub struct AllocationGraph {
    edges: IndexMap<String, Vec<Allocation>>,
}

impl AllocationGraph {
    pub fn children_of(&self, contract: &str) -> &[Allocation] {
        self.edges.get(contract).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Finds the unique `new T(...)` construction expression assigned to field
/// `field_name` anywhere in `ctor_body`, if any. Used by [`specialise`] to
/// resolve an interface-typed field to its concrete constructed type.
fn find_construction_target<'ast>(body: &'ast solbmc_ast::Stmt, field_name: &str) -> Vec<String> {
    let mut targets = Vec::new();
    crate::walk::visit_stmt_exprs(body, &mut |expr| {
        if let Expr::Assign { lhs, rhs, .. } = expr {
            if lhs.base_ident() == Some(field_name) {
                let mut new_targets = Vec::new();
                visit_expr(rhs, &mut |e| {
                    if let Expr::New { ty: Type::Custom(name), .. } = e {
                        new_targets.push(name.clone());
                    }
                });
                targets.extend(new_targets);
            }
        }
    });
    targets
}

/// Resolves the concrete type a state variable `field` ultimately holds:
/// the unique type constructed for it in `owner`'s constructor, or its own
/// declared type if it is never (re-)assigned a `new` expression.
pub fn specialise(
    owner: &ContractDef,
    field: &solbmc_ast::StateVarDef,
) -> Result<String, InvariantViolation> {
    let declared = match &field.ty {
        Type::Custom(name) => name.clone(),
        _ => return Ok(String::new()), // not a contract-typed field; caller filters these out
    };

    let mut targets: Vec<String> = Vec::new();
    if let Some(Expr::New { ty: Type::Custom(name), .. }) = &field.initializer {
        targets.push(name.clone());
    }
    if let Some(ctor) = owner.constructor() {
        if let Some(body) = &ctor.body {
            targets.extend(find_construction_target(body, &field.name));
        }
    }

    let mut distinct: Vec<String> = Vec::new();
    for t in targets {
        if !distinct.contains(&t) {
            distinct.push(t);
        }
    }
    match distinct.len() {
        0 => Ok(declared),
        1 => Ok(distinct.remove(0)),
        _ => Err(InvariantViolation::AmbiguousSpecialisation {
            contract: owner.name.clone(),
            field: field.name.clone(),
        }),
    }
}

/// Builds the allocation graph over every contract in `contracts`, using
/// `resolve` to look up a contract definition by name (so that a field's
/// declared interface type can be followed to its concrete class, and
/// that class's own allocations included transitively once flattened by
/// the caller, e.g. [`crate::tight_bundle`]).
pub fn build<'ast>(
    contracts: &[&'ast ContractDef],
) -> Result<AllocationGraph, InvariantViolation> {
    let mut edges: IndexMap<String, Vec<Allocation>> = IndexMap::new();
    for contract in contracts {
        let mut allocations = Vec::new();
        for var in contract.state_vars() {
            if !matches!(var.ty, Type::Custom(_)) {
                continue;
            }
            let target = specialise(contract, var)?;
            if !target.is_empty() {
                allocations.push(Allocation { field: var.name.clone(), target });
            }
        }
        edges.insert(contract.name.clone(), allocations);
    }
    Ok(AllocationGraph { edges })
}
