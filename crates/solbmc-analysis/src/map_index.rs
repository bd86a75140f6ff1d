//! Stage 6: the map index summary (spec §4.7).
//!
//! Classifies a contract as *index-conforming* or *violating* in its
//! treatment of address-typed map keys, and separately collects every
//! address literal appearing anywhere in the contract (consumed by
//! [`crate::address_space`]). Grounded on the literal-handling half of
//! `AbstractAddressDomain.{h,cpp}` plus the violation vocabulary of spec
//! §4.7, which has no single dedicated file in the reference tool.

use std::collections::HashMap;

use indexmap::IndexSet;
use solbmc_ast::{BinaryOp, ContractDef, Expr, FunctionDef, Literal, Param, Stmt, Type, UnaryOp};

use crate::types::is_address_typed;
use crate::walk::visit_stmt_exprs;

/// The three ways a contract can stop treating an address as an opaque
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// An address value is converted to a non-address integer type.
    Cast,
    /// An arithmetic operator is applied to an address value.
    Mutate,
    /// An ordering comparison (not equality) is applied to an address
    /// value.
    Compare,
}

/// A single recorded violation: which function it occurred in, and what
/// kind it was. The AST site itself is not retained (the plain-data AST
/// carries no identity beyond structural equality), matching the "merely
/// flag the function" granularity spec §4.7 needs to decide conformance.
#[derive(Debug, Clone)]
pub struct Violation {
    pub function: String,
    pub kind: ViolationKind,
}

/// Per-contract result: every violation found, plus every address literal
/// value encountered (as written in the source, including `0`).
#[derive(Debug, Default)]
pub struct MapIndexSummary {
    pub violations: Vec<Violation>,
    pub literals: IndexSet<String>,
}

impl MapIndexSummary {
    pub fn is_conforming(&self) -> bool {
        self.violations.is_empty()
    }

    /// Merges per-contract summaries (as produced by [`summarize`]) into a
    /// single program-wide summary, in the order the contracts were given.
    /// Literal address values are deduplicated across contracts; violations
    /// are simply concatenated, since two contracts can never share a
    /// function.
    pub fn merge(summaries: impl IntoIterator<Item = MapIndexSummary>) -> MapIndexSummary {
        let mut merged = MapIndexSummary::default();
        for summary in summaries {
            merged.violations.extend(summary.violations);
            merged.literals.extend(summary.literals);
        }
        merged
    }

    /// The number of distinct abstract addresses the emitted model must be
    /// able to represent (spec §3, §4.10): every tight-bundle instance (each
    /// gets its own address) plus every literal address value that isn't
    /// already covered by an instance address, plus the reserved null
    /// address. Consumed as `MAX_ADDR` by [`crate::address_space`].
    pub fn representative_count(&self, tight_bundle_size: u64) -> u64 {
        tight_bundle_size + 1 + self.literals.len() as u64
    }
}

type TypeEnv = HashMap<String, Type>;

fn build_env(contract: &ContractDef, func: &FunctionDef) -> TypeEnv {
    let mut env = TypeEnv::new();
    for v in contract.state_vars() {
        env.insert(v.name.clone(), v.ty.clone());
    }
    for p in &func.params {
        if let Some(name) = &p.name {
            env.insert(name.clone(), p.ty.clone());
        }
    }
    env
}

fn record_var_decls(env: &mut TypeEnv, stmt: &Stmt) {
    match stmt {
        Stmt::VarDecl { decls, .. } => {
            for d in decls {
                env.insert(d.name.clone(), d.ty.clone());
            }
        }
        Stmt::Block(stmts) => {
            for s in stmts {
                record_var_decls(env, s);
            }
        }
        Stmt::If { then_branch, else_branch, .. } => {
            record_var_decls(env, then_branch);
            if let Some(e) = else_branch {
                record_var_decls(env, e);
            }
        }
        Stmt::While { body, .. } => record_var_decls(env, body),
        Stmt::For { init, body, .. } => {
            if let Some(init) = init {
                record_var_decls(env, init);
            }
            record_var_decls(env, body);
        }
        _ => {}
    }
}

fn is_addressy(env: &TypeEnv, expr: &Expr) -> bool {
    match expr {
        Expr::Literal(Literal::Address(_)) => true,
        Expr::Ident(name) => env.get(name).map(is_address_typed).unwrap_or(false),
        _ => false,
    }
}

fn collect_literals(expr: &Expr, literals: &mut IndexSet<String>) {
    if let Expr::Literal(Literal::Address(value)) = expr {
        literals.insert(value.clone());
    }
}

/// Builds the map-index summary for a single contract over its own
/// (non-inherited) function bodies. Called once per bundled contract by
/// [`crate::stack::AnalysisStack`].
pub fn summarize(contract: &ContractDef) -> MapIndexSummary {
    let mut summary = MapIndexSummary::default();

    for func in contract.functions() {
        let Some(body) = &func.body else { continue };
        let mut env = build_env(contract, func);
        record_var_decls(&mut env, body);

        visit_stmt_exprs(body, &mut |expr| {
            collect_literals(expr, &mut summary.literals);

            match expr {
                Expr::Call { callee, args } => {
                    if let (Expr::Ident(type_name), [arg]) = (callee.as_ref(), args.as_slice()) {
                        let casts_to_non_address = matches!(
                            type_name.as_str(),
                            "uint" | "uint8" | "uint16" | "uint32" | "uint64" | "uint128" | "uint256"
                                | "int" | "int8" | "int16" | "int32" | "int64" | "int128" | "int256"
                        );
                        if casts_to_non_address && is_addressy(&env, arg) {
                            summary.violations.push(Violation {
                                function: func.dispatch_name().to_string(),
                                kind: ViolationKind::Cast,
                            });
                        }
                    }
                }
                Expr::Binary { op, lhs, rhs } => {
                    let touches_address = is_addressy(&env, lhs) || is_addressy(&env, rhs);
                    if !touches_address {
                        return;
                    }
                    let arithmetic = matches!(
                        op,
                        BinaryOp::Add
                            | BinaryOp::Sub
                            | BinaryOp::Mul
                            | BinaryOp::Div
                            | BinaryOp::Mod
                            | BinaryOp::Shl
                            | BinaryOp::Shr
                    );
                    if arithmetic {
                        summary.violations.push(Violation {
                            function: func.dispatch_name().to_string(),
                            kind: ViolationKind::Mutate,
                        });
                    } else if op.is_ordering() {
                        summary.violations.push(Violation {
                            function: func.dispatch_name().to_string(),
                            kind: ViolationKind::Compare,
                        });
                    }
                }
                Expr::Unary { op, expr: inner } => {
                    if is_addressy(&env, inner)
                        && matches!(op, UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec)
                    {
                        summary.violations.push(Violation {
                            function: func.dispatch_name().to_string(),
                            kind: ViolationKind::Mutate,
                        });
                    }
                }
                _ => {}
            }
        });

        // literals also appear in default parameter expressions, if any;
        // params themselves carry no initializer in this AST, so nothing
        // further to scan here.
        let _ = &func.params as &[Param];
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbmc_ast::{ContractItem, ContractKind, FunctionKind, StateVarDef, Visibility};

    fn contract_with_body(body: Stmt) -> ContractDef {
        ContractDef {
            name: "A".into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![
                ContractItem::StateVar(StateVarDef {
                    name: "owner".into(),
                    ty: Type::Address { payable: false },
                    initializer: None,
                }),
                ContractItem::Function(FunctionDef {
                    kind: FunctionKind::Function,
                    name: Some("f".into()),
                    visibility: Visibility::Public,
                    params: vec![],
                    returns: vec![],
                    modifiers: vec![],
                    body: Some(body),
                    super_function: None,
                }),
            ],
        }
    }

    #[test]
    fn no_violations_on_plain_equality() {
        let body = Stmt::Expr(Expr::Binary {
            op: BinaryOp::Eq,
            lhs: Box::new(Expr::Ident("owner".into())),
            rhs: Box::new(Expr::Literal(Literal::Address("0x0".into()))),
        });
        let summary = summarize(&contract_with_body(body));
        assert!(summary.is_conforming());
        assert_eq!(summary.literals.len(), 1);
    }

    #[test]
    fn detects_cast_violation() {
        let body = Stmt::Expr(Expr::Call {
            callee: Box::new(Expr::Ident("uint256".into())),
            args: vec![Expr::Ident("owner".into())],
        });
        let summary = summarize(&contract_with_body(body));
        assert_eq!(summary.violations.len(), 1);
        assert_eq!(summary.violations[0].kind, ViolationKind::Cast);
    }

    #[test]
    fn detects_compare_violation() {
        let body = Stmt::Expr(Expr::Binary {
            op: BinaryOp::Lt,
            lhs: Box::new(Expr::Ident("owner".into())),
            rhs: Box::new(Expr::Literal(Literal::Address("0x1".into()))),
        });
        let summary = summarize(&contract_with_body(body));
        assert_eq!(summary.violations.len(), 1);
        assert_eq!(summary.violations[0].kind, ViolationKind::Compare);
    }

    #[test]
    fn representative_count_adds_bundle_size_reserved_and_literals() {
        let mut a = MapIndexSummary::default();
        a.literals.insert("0x1".into());
        let mut b = MapIndexSummary::default();
        b.literals.insert("0x2".into());
        b.literals.insert("0x1".into()); // duplicate across contracts
        let merged = MapIndexSummary::merge([a, b]);
        assert_eq!(merged.literals.len(), 2);
        assert_eq!(merged.representative_count(5), 5 + 1 + 2);
    }

    #[test]
    fn no_violation_with_no_address_keys() {
        let body = Stmt::Expr(Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Literal(Literal::Number("1".into()))),
            rhs: Box::new(Expr::Literal(Literal::Number("2".into()))),
        });
        let summary = summarize(&contract_with_body(body));
        assert!(summary.is_conforming());
        assert!(summary.literals.is_empty());
    }
}
