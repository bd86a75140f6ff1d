//! Stage 1: the bundle extractor (spec §4.1).
//!
//! Grounded on `BundleExtractor` in the reference tool's
//! `cli/Bundle.{h,cpp}`: build a name-to-contract map over every
//! non-library, non-interface definition in the loaded source units, then
//! resolve the requested names against it in order.

use indexmap::IndexMap;
use solbmc_ast::{ContractDef, ContractKind, SourceUnit};

/// The result of resolving a requested bundle against a set of source
/// units: the contracts that were found, in request order, and the names
/// that were not.
#[derive(Debug, Default)]
pub struct Bundle<'ast> {
    contracts: Vec<&'ast ContractDef>,
    missing: Vec<String>,
}

impl<'ast> Bundle<'ast> {
    /// The resolved contracts, in the order they were requested.
    pub fn contracts(&self) -> &[&'ast ContractDef] {
        &self.contracts
    }

    /// Requested names that matched no contract definition.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

/// Resolves `names` against every contract (not library, not interface)
/// declared across `units`. A name repeated across units keeps the last
/// definition seen, mirroring the reference tool's overwrite-on-insert map.
pub fn extract_bundle<'ast>(units: &'ast [SourceUnit], names: &[String]) -> Bundle<'ast> {
    let mut by_name: IndexMap<&str, &ContractDef> = IndexMap::new();
    for unit in units {
        for contract in &unit.contracts {
            if matches!(contract.kind, ContractKind::Library | ContractKind::Interface) {
                continue;
            }
            by_name.insert(contract.name.as_str(), contract);
        }
    }

    let mut contracts = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in names {
        match by_name.get(name.as_str()) {
            Some(&contract) => contracts.push(contract),
            None => missing.push(name.clone()),
        }
    }

    Bundle { contracts, missing }
}
