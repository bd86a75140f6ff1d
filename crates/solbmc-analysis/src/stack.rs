//! The analysis stack: the single top-to-bottom pipeline entry point.
//!
//! Owns every pass's output for the remainder of translation (spec §3
//! "Ownership"). Constructed once, by [`AnalysisStack::build`], from a pool
//! of source units and a requested bundle; downstream passes borrow from
//! earlier fields during construction, and the code generator borrows from
//! the finished stack afterward. Grounded on the `Context`/`ExpCtxt`
//! single-construction-then-read-only-borrow pattern of
//! `sol-macro/src/expand/mod.rs`, generalized from one expansion pass to
//! the full eleven-stage pipeline.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, SourceUnit};
use tracing::info;

use crate::alloc_graph::{self, AllocationGraph};
use crate::bundle::{self, Bundle};
use crate::call_graph::{self, CallGraph};
use crate::error::TranslateError;
use crate::expr_analysis::{self, SpecializationMap};
use crate::flat_contract::{flatten, resolve_linearization, FlatContract};
use crate::library::{self, LibrarySummary};
use crate::map_index::MapIndexSummary;
use crate::strings::{self, StringLookup};
use crate::tight_bundle::{self, TightBundleTree};

/// Every contract definition pooled across the loaded source units, keyed
/// by name. Used by every pass that needs to resolve a name outside the
/// bundle itself (a library, an unbundled intermediate contract type in an
/// allocation or specialisation chain).
pub type ContractPool<'ast> = IndexMap<&'ast str, &'ast ContractDef>;

fn pool_contracts(units: &[SourceUnit]) -> ContractPool<'_> {
    let mut pool = IndexMap::new();
    for unit in units {
        for contract in &unit.contracts {
            pool.insert(contract.name.as_str(), contract);
        }
    }
    pool
}

/// The assembled, immutable output of every analysis pass (spec §2
/// pipeline steps 1-10; step 11, code generation, consumes this from the
/// `solbmc-codegen` crate).
pub struct AnalysisStack<'ast> {
    pub bundle: Bundle<'ast>,
    pub flat_contracts: Vec<FlatContract<'ast>>,
    pub spec_map: SpecializationMap,
    pub call_graph: CallGraph<'ast>,
    pub map_index: MapIndexSummary,
    pub strings: StringLookup,
    pub library_summary: LibrarySummary<'ast>,
    pub tight_bundle: TightBundleTree<'ast>,
}

impl<'ast> AnalysisStack<'ast> {
    /// Runs every analysis pass in pipeline order over `units`, bundling
    /// `names`. A missing bundle name is not fatal here: the caller (the
    /// CLI) decides, consulting `stack.bundle.missing()`, whether to abort.
    #[tracing::instrument(skip_all, fields(units = units.len(), requested = names.len()))]
    pub fn build(units: &'ast [SourceUnit], names: &[String]) -> Result<Self, TranslateError> {
        let pool = pool_contracts(units);
        let all_defs: Vec<&'ast ContractDef> = pool.values().copied().collect();

        let bundle = bundle::extract_bundle(units, names);
        info!(resolved = bundle.contracts().len(), missing = bundle.missing().len(), "bundle extracted");

        let alloc_graph: AllocationGraph = alloc_graph::build(&all_defs)?;

        let flat_contracts: Vec<FlatContract<'ast>> =
            bundle.contracts().iter().map(|&c| flatten(&resolve_linearization(c, &pool))).collect();
        info!(contracts = flat_contracts.len(), "flat contracts built");

        let spec_map = expr_analysis::build_specialization_map(&all_defs)?;

        let call_graph = call_graph::build(&flat_contracts, &pool, &spec_map);
        info!(functions = call_graph.executed_code().count(), "call graph closed");

        let map_index =
            MapIndexSummary::merge(bundle.contracts().iter().map(|&c| crate::map_index::summarize(c)));
        info!(
            literals = map_index.literals.len(),
            violations = map_index.violations.len(),
            "map index summarized"
        );

        let strings = strings::build(bundle.contracts(), &call_graph)?;

        let library_summary = library::build(&call_graph, &pool);
        info!(libraries = library_summary.view().len(), "library summary built");

        let tight_bundle = tight_bundle::build(&flat_contracts, &pool, &alloc_graph);
        info!(addresses = tight_bundle.size(), "tight bundle expanded");

        Ok(Self { bundle, flat_contracts, spec_map, call_graph, map_index, strings, library_summary, tight_bundle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solbmc_ast::{ContractItem, ContractKind, FunctionDef, FunctionKind, Visibility};

    fn contract_with_entry(name: &str) -> ContractDef {
        ContractDef {
            name: name.into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![ContractItem::Function(FunctionDef {
                kind: FunctionKind::Function,
                name: Some("f".into()),
                visibility: Visibility::Public,
                params: vec![],
                returns: vec![],
                modifiers: vec![],
                body: Some(solbmc_ast::Stmt::Block(vec![])),
                super_function: None,
            })],
        }
    }

    #[test]
    fn empty_bundle_yields_empty_analyses() {
        let unit = SourceUnit { contracts: vec![contract_with_entry("A")] };
        let units = [unit];
        let stack = AnalysisStack::build(&units, &[]).unwrap();
        assert!(stack.bundle.contracts().is_empty());
        assert!(stack.bundle.missing().is_empty());
        assert_eq!(stack.tight_bundle.size(), 0);
        assert!(stack.flat_contracts.is_empty());
    }

    #[test]
    fn single_bundled_contract_reaches_its_own_entry_point() {
        let unit = SourceUnit { contracts: vec![contract_with_entry("A")] };
        let units = [unit];
        let stack = AnalysisStack::build(&units, &["A".to_string()]).unwrap();
        assert_eq!(stack.bundle.contracts().len(), 1);
        assert_eq!(stack.tight_bundle.size(), 1);
        let names: Vec<_> = stack.call_graph.executed_code().map(|f| f.dispatch_name().to_string()).collect();
        assert_eq!(names, vec!["f".to_string()]);
    }

    #[test]
    fn missing_bundle_name_is_reported_but_not_fatal() {
        let unit = SourceUnit { contracts: vec![contract_with_entry("A")] };
        let units = [unit];
        let stack = AnalysisStack::build(&units, &["A".to_string(), "Ghost".to_string()]).unwrap();
        assert_eq!(stack.bundle.contracts().len(), 1);
        assert_eq!(stack.bundle.missing(), &["Ghost".to_string()]);
    }
}
