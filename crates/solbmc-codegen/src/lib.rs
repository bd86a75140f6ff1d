//! Stage 11 (spec §4.12): the code generator.
//!
//! Consumes the finished [`solbmc_analysis::AnalysisStack`] and an
//! [`Options`] set and emits the full translated C-like model as one
//! string, in the order the reference tool's `PrintModel.cpp` emits it:
//! records, then ordinary function bodies, then the Ether helpers, then
//! the non-deterministic source dump, then the address-space
//! initialiser, then the harness driver.

pub mod address_space_gen;
pub mod driver;
pub mod emitter;
pub mod ether;
pub mod lowering;
pub mod magic;
pub mod nondet_dump;
pub mod options;
pub mod records;

use indexmap::IndexMap;
use solbmc_analysis::address_space;
use solbmc_analysis::error::TranslateError;
use solbmc_analysis::nondet::NondetSourceRegistry;
use solbmc_analysis::stack::AnalysisStack;
use solbmc_analysis::tight_bundle::BundleContract;
use solbmc_ast::{ContractDef, StateVarDef};

use emitter::Emitter;
use records::RecordCatalog;

pub use options::Options;

fn find_flat_vars<'ast>(node: &BundleContract<'ast>, name: &str) -> Option<Vec<&'ast StateVarDef>> {
    if node.contract.source.name == name {
        return Some(node.contract.state_vars().to_vec());
    }
    node.children().iter().find_map(|c| find_flat_vars(c, name))
}

/// Every distinct contract's state variables, flattened through
/// inheritance wherever the contract occurs in the tight bundle; a
/// contract that is only ever referenced as a library (never
/// instantiated) has no allocation-graph entry to flatten through, so it
/// falls back to its own directly declared state variables (libraries
/// carry no storage in the Solidity model this translator targets).
fn flat_vars_for<'ast>(stack: &AnalysisStack<'ast>, contract: &'ast ContractDef) -> Vec<&'ast StateVarDef> {
    for root in stack.tight_bundle.roots() {
        if let Some(vars) = find_flat_vars(root, &contract.name) {
            return vars;
        }
    }
    contract.state_vars().collect()
}

/// Translates `stack` into the complete emitted model text (spec §4.12).
pub fn generate(stack: &AnalysisStack<'_>, opts: &Options) -> Result<String, TranslateError> {
    let catalog = RecordCatalog::build(stack);
    let mut e = Emitter::new();
    let mut registry = NondetSourceRegistry::new();
    let bundle_size = stack.tight_bundle.size();

    records::emit_call_state(&mut e, opts);
    e.blank();
    for contract in catalog.contracts() {
        let flat_vars = flat_vars_for(stack, contract);
        records::emit_contract_record(&mut e, contract, &flat_vars, &catalog, opts);
        e.blank();
    }
    records::emit_pending_records(&mut e, &catalog, opts);
    e.blank();

    let contract_pool: IndexMap<&str, &ContractDef> =
        catalog.contracts().iter().map(|c| (c.name.as_str(), *c)).collect();
    for contract in catalog.contracts() {
        let lowering_ctx =
            lowering::LoweringCtx { enum_names: &catalog.enum_names, contract, contracts: &contract_pool };
        for f in contract.functions() {
            lowering::lower_function(f, &mut e, &lowering_ctx, opts)?;
            e.blank();
        }
    }

    ether::emit_dispatch(&mut e, &stack.tight_bundle);
    e.blank();
    ether::emit_helpers(&mut e);
    e.blank();

    nondet_dump::emit(&mut e, &mut registry, &catalog, bundle_size);
    e.blank();

    let plan = address_space::plan(&stack.map_index, bundle_size.max(address_space::MIN_ADDR));
    address_space_gen::emit(&mut e, &plan);
    e.blank();

    driver::emit(&mut e, &stack.tight_bundle, &mut registry, &catalog, opts);

    Ok(e.into_string())
}
