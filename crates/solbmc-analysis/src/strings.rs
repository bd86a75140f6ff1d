//! Stage 7: string lookup (spec §4.8).
//!
//! Grounded verbatim on `StringLookup.{h,cpp}`: visit state-variable
//! initialisers, then every function reachable in the call graph, then
//! every applied modifier, assigning each distinct string literal the
//! next unused positive integer; the empty string is pre-mapped to 0.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, Expr, Literal};

use crate::call_graph::CallGraph;
use crate::error::InvariantViolation;
use crate::walk::visit_stmt_exprs;

/// A deterministic, injective string-to-code table.
#[derive(Debug)]
pub struct StringLookup {
    registry: IndexMap<String, u32>,
    next_index: u32,
}

impl StringLookup {
    fn record(&mut self, value: &str) -> Result<(), InvariantViolation> {
        if self.registry.contains_key(value) {
            return Ok(());
        }
        if self.next_index == 0 {
            return Err(InvariantViolation::LookupExhausted);
        }
        self.registry.insert(value.to_string(), self.next_index);
        self.next_index = self.next_index.checked_add(1).ok_or(InvariantViolation::LookupExhausted)?;
        Ok(())
    }

    /// Returns the code for `value`. Fails if `value` was never recorded
    /// during construction (it is not necessarily a bug at the call site:
    /// the reference tool also throws here, treating it as "should never
    /// happen" given the literal was visited during the same walk).
    pub fn lookup(&self, value: &str) -> Result<u32, InvariantViolation> {
        if value.is_empty() {
            return Ok(0);
        }
        self.registry.get(value).copied().ok_or(InvariantViolation::NonStringLookup)
    }
}

fn visit_literals(expr: &Expr, on_string: &mut impl FnMut(&str) -> Result<(), InvariantViolation>) -> Result<(), InvariantViolation> {
    let mut err = Ok(());
    let mut record = |e: &Expr| {
        if err.is_err() {
            return;
        }
        if let Expr::Literal(Literal::Str(s)) = e {
            err = on_string(s);
        }
    };
    crate::walk::visit_expr(expr, &mut record);
    err
}

/// Builds the string lookup table by visiting, in order: every bundled
/// contract's state-variable initialisers, every function in
/// `graph.executed_code()`, and every modifier in
/// `graph.applied_modifiers()`.
pub fn build<'ast>(
    contracts: &[&'ast ContractDef],
    graph: &CallGraph<'ast>,
) -> Result<StringLookup, InvariantViolation> {
    let mut table = StringLookup { registry: IndexMap::new(), next_index: 1 };

    for contract in contracts {
        for var in contract.state_vars() {
            if let Some(init) = &var.initializer {
                visit_literals(init, &mut |s| table.record(s))?;
            }
        }
    }
    // walk is infallible, so collect literals per body then record them,
    // matching the reference tool's separate function/modifier loops.
    for func in graph.executed_code() {
        if let Some(body) = &func.body {
            let mut strings = Vec::new();
            visit_stmt_exprs(body, &mut |e| {
                if let Expr::Literal(Literal::Str(s)) = e {
                    strings.push(s.clone());
                }
            });
            for s in strings {
                table.record(&s)?;
            }
        }
    }
    for modifier in graph.applied_modifiers() {
        if let Some(body) = &modifier.body {
            let mut strings = Vec::new();
            visit_stmt_exprs(body, &mut |e| {
                if let Expr::Literal(Literal::Str(s)) = e {
                    strings.push(s.clone());
                }
            });
            for s in strings {
                table.record(&s)?;
            }
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero() {
        let table = StringLookup { registry: IndexMap::new(), next_index: 1 };
        assert_eq!(table.lookup("").unwrap(), 0);
    }

    #[test]
    fn injective_over_distinct_literals() {
        let mut table = StringLookup { registry: IndexMap::new(), next_index: 1 };
        table.record("a").unwrap();
        table.record("b").unwrap();
        table.record("a").unwrap();
        assert_eq!(table.lookup("a").unwrap(), 1);
        assert_eq!(table.lookup("b").unwrap(), 2);
        assert_ne!(table.lookup("a").unwrap(), table.lookup("b").unwrap());
    }

    #[test]
    fn unknown_literal_errors() {
        let table = StringLookup { registry: IndexMap::new(), next_index: 1 };
        assert!(table.lookup("nope").is_err());
    }
}
