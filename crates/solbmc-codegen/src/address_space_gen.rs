//! Address-space initialiser emission (spec §4.10 / §6 "Address space"):
//! prints one global per literal address plus the pairwise-distinctness
//! assumptions that keep non-deterministically-assigned literals apart.
//!
//! Grounded on `AddressSpace::map_constants`'s caller in the reference
//! tool's scheduler driver: the plan itself (what each literal is
//! assigned and which earlier literals it must differ from) comes from
//! [`solbmc_analysis::address_space`] verbatim; this module only decides
//! how that plan reads as C declarations and `sol_assume` calls.

use solbmc_analysis::address_space::{AddressSpacePlan, LiteralAssignment};

use crate::emitter::Emitter;

/// Declares every literal address global, then seeds it according to its
/// [`LiteralAssignment`], then asserts it apart from every literal already
/// seeded (the plan's `distinct_from` list, spec §4.10).
pub fn emit(e: &mut Emitter, plan: &AddressSpacePlan) {
    for lit in &plan.literals {
        e.line(format!("uint160_t {};", lit.name));
    }
    e.blank();

    e.line("static void sol_init_address_space(void) {");
    e.indented(|e| {
        for lit in &plan.literals {
            match lit.assignment {
                LiteralAssignment::Zero => {
                    e.line(format!("{} = 0;", lit.name));
                }
                LiteralAssignment::Nondet { max } => {
                    e.line(format!(
                        "{} = rt_nd_range({}, {}, \"address literal\");",
                        lit.name,
                        solbmc_analysis::address_space::MIN_ADDR,
                        max
                    ));
                    for other in &lit.distinct_from {
                        e.line(format!("sol_assume({} != {});", lit.name, other));
                    }
                }
            }
        }
    });
    e.line("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbmc_analysis::address_space::{AddressSpacePlan, LiteralAssignment, LiteralPlan};

    #[test]
    fn zero_literal_assigns_without_distinctness_assumptions() {
        let plan = AddressSpacePlan {
            max_addr: 4,
            literals: vec![LiteralPlan {
                name: "g_literal_address_0".into(),
                assignment: LiteralAssignment::Zero,
                distinct_from: Vec::new(),
            }],
        };
        let mut e = Emitter::new();
        emit(&mut e, &plan);
        let text = e.into_string();
        assert!(text.contains("uint160_t g_literal_address_0;"));
        assert!(text.contains("g_literal_address_0 = 0;"));
        assert!(!text.contains("sol_assume"));
    }

    #[test]
    fn nondet_literals_emit_pairwise_distinctness_assumptions() {
        let plan = AddressSpacePlan {
            max_addr: 4,
            literals: vec![
                LiteralPlan {
                    name: "g_literal_address_0x1".into(),
                    assignment: LiteralAssignment::Nondet { max: 4 },
                    distinct_from: Vec::new(),
                },
                LiteralPlan {
                    name: "g_literal_address_0x2".into(),
                    assignment: LiteralAssignment::Nondet { max: 4 },
                    distinct_from: vec!["g_literal_address_0x1".into()],
                },
            ],
        };
        let mut e = Emitter::new();
        emit(&mut e, &plan);
        let text = e.into_string();
        assert!(text.contains("g_literal_address_0x1 = rt_nd_range(1, 4, \"address literal\");"));
        assert!(text.contains("sol_assume(g_literal_address_0x2 != g_literal_address_0x1);"));
    }
}
