//! Stage (spec §4.10): the address space.
//!
//! Computes, from the whole-program [`MapIndexSummary`], the plan for
//! mapping every literal address value encountered in the source to either
//! the reserved zero address or a freshly allocated non-deterministic
//! value, together with the pairwise-distinctness constraints between
//! non-zero literals that keep them from colliding. Grounded verbatim on
//! `AddressSpace::map_constants` in the reference tool's
//! `scheduler/AddressSpace.{h,cpp}`; the logic is kept decoupled from the
//! scheduler/driver here exactly as the reference header's own doc comment
//! recommends, so this module hands the emitter a plan rather than emitted
//! text.

use indexmap::IndexSet;

use crate::map_index::MapIndexSummary;

/// The minimum allocatable address; address 0 is reserved for the null
/// contract and is never handed out by [`plan`]'s non-deterministic range.
pub const MIN_ADDR: u64 = 1;

/// A soft watch threshold (spec §9 open question 3): the pairwise
/// distinctness constraints below are quadratic in the literal count, which
/// the reference tool accepts as "bad for fuzzing but the set is small". A
/// literal set larger than this is logged at `info` but still processed in
/// full; this is an observability aid, not a behavior change.
pub const LARGE_LITERAL_SET_WATCH_THRESHOLD: usize = 32;

/// How a single literal address constant is assigned a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralAssignment {
    /// The literal `0`, which is always the reserved null address.
    Zero,
    /// A non-deterministic value drawn from `[MIN_ADDR, max]`.
    Nondet { max: u64 },
}

/// One literal's generated-code entry: its global variable name, how it is
/// assigned, and which previously-planned non-zero literals it must be
/// proven distinct from.
#[derive(Debug, Clone)]
pub struct LiteralPlan {
    pub name: String,
    pub assignment: LiteralAssignment,
    pub distinct_from: Vec<String>,
}

/// The complete address-space plan: every literal's entry, in the order the
/// summary's literal set was populated (itself the AST visit order, per
/// [`crate::map_index`]).
#[derive(Debug)]
pub struct AddressSpacePlan {
    pub max_addr: u64,
    pub literals: Vec<LiteralPlan>,
}

/// Mirrors the reference tool's `g_literal_address_<value>` naming
/// (`AbstractAddressDomain::literal_name`).
pub fn literal_name(value: &str) -> String {
    format!("g_literal_address_{value}")
}

/// Builds the address-space plan for `summary`, given the representative
/// count already computed from the tight-bundle size
/// ([`MapIndexSummary::representative_count`]).
pub fn plan(summary: &MapIndexSummary, max_addr: u64) -> AddressSpacePlan {
    if summary.literals.len() > LARGE_LITERAL_SET_WATCH_THRESHOLD {
        tracing::info!(
            literal_count = summary.literals.len(),
            threshold = LARGE_LITERAL_SET_WATCH_THRESHOLD,
            "address-space literal set exceeds the quadratic-constraint watch threshold"
        );
    }

    let mut used_so_far: IndexSet<String> = IndexSet::new();
    let mut literals = Vec::with_capacity(summary.literals.len());
    for lit in &summary.literals {
        let name = literal_name(lit);
        if lit == "0" {
            literals.push(LiteralPlan { name, assignment: LiteralAssignment::Zero, distinct_from: Vec::new() });
            continue;
        }
        let distinct_from: Vec<String> = used_so_far.iter().cloned().collect();
        literals.push(LiteralPlan { name: name.clone(), assignment: LiteralAssignment::Nondet { max: max_addr }, distinct_from });
        used_so_far.insert(name);
    }

    AddressSpacePlan { max_addr, literals }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with(literals: &[&str]) -> MapIndexSummary {
        let mut s = MapIndexSummary::default();
        for l in literals {
            s.literals.insert((*l).to_string());
        }
        s
    }

    #[test]
    fn zero_literal_is_assigned_directly() {
        let s = summary_with(&["0"]);
        let p = plan(&s, 10);
        assert_eq!(p.literals.len(), 1);
        assert_eq!(p.literals[0].assignment, LiteralAssignment::Zero);
        assert!(p.literals[0].distinct_from.is_empty());
    }

    #[test]
    fn non_zero_literals_accumulate_distinctness_constraints() {
        let s = summary_with(&["0x1", "0x2", "0x3"]);
        let p = plan(&s, 10);
        assert_eq!(p.literals[0].distinct_from.len(), 0);
        assert_eq!(p.literals[1].distinct_from.len(), 1);
        assert_eq!(p.literals[2].distinct_from.len(), 2);
        for lit in &p.literals {
            assert_eq!(lit.assignment, LiteralAssignment::Nondet { max: 10 });
        }
    }

    #[test]
    fn no_literals_yields_empty_plan() {
        let s = MapIndexSummary::default();
        let p = plan(&s, 1);
        assert!(p.literals.is_empty());
    }
}
