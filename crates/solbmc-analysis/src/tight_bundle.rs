//! Stage 10 (spec §4.9): the tight bundle.
//!
//! Unfolds the allocation graph from the bundled roots into a tree of
//! instances, assigning each a unique address beginning at 1 (address 0 is
//! reserved for the null contract). Grounded verbatim on
//! `BundleContract`/`TightBundleModel` in the reference tool's
//! `analysis/TightBundle.{h,cpp}`.

use indexmap::IndexMap;
use solbmc_ast::ContractDef;

use crate::alloc_graph::AllocationGraph;
use crate::flat_contract::{flatten, resolve_linearization, FlatContract};

/// One instantiated contract in the deployment forest.
#[derive(Debug, Clone)]
pub struct BundleContract<'ast> {
    /// 1-indexed; dense and unique across the whole forest.
    pub address: u64,
    /// The field name through which the parent constructs this instance;
    /// empty for a top-level bundle root, which has no enclosing field.
    pub var: String,
    pub contract: FlatContract<'ast>,
    children: Vec<BundleContract<'ast>>,
}

impl<'ast> BundleContract<'ast> {
    pub fn children(&self) -> &[BundleContract<'ast>] {
        &self.children
    }
}

/// The rooted forest produced by expanding every bundled contract's
/// allocation subtree.
#[derive(Debug, Default)]
pub struct TightBundleTree<'ast> {
    size: u64,
    roots: Vec<BundleContract<'ast>>,
}

impl<'ast> TightBundleTree<'ast> {
    /// Total number of allocated contract instances across the whole
    /// forest.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn roots(&self) -> &[BundleContract<'ast>] {
        &self.roots
    }
}

fn expand<'ast>(
    contract_name: &str,
    var: String,
    all_contracts: &IndexMap<&str, &'ast ContractDef>,
    alloc_graph: &AllocationGraph,
    next_id: &mut u64,
) -> Option<BundleContract<'ast>> {
    let def = *all_contracts.get(contract_name)?;
    let linearization = resolve_linearization(def, all_contracts);
    let contract = flatten(&linearization);

    let id = *next_id;
    *next_id += 1;

    let children = alloc_graph
        .children_of(contract_name)
        .iter()
        .filter_map(|edge| expand(&edge.target, edge.field.clone(), all_contracts, alloc_graph, next_id))
        .collect();

    // Accounts for the zero address.
    Some(BundleContract { address: id + 1, var, contract, children })
}

/// Expands every bundled contract's allocation subtree into a forest,
/// assigning addresses with one counter shared across every root. Silently
/// drops a bundled contract that cannot be found in `all_contracts`; the
/// bundle extractor (§4.1) is the authority on missing names and has
/// already reported them.
pub fn build<'ast>(
    bundle: &[FlatContract<'ast>],
    all_contracts: &IndexMap<&str, &'ast ContractDef>,
    alloc_graph: &AllocationGraph,
) -> TightBundleTree<'ast> {
    let mut next_id = 0u64;
    let roots = bundle
        .iter()
        .filter_map(|flat| expand(&flat.source.name, String::new(), all_contracts, alloc_graph, &mut next_id))
        .collect();
    TightBundleTree { size: next_id, roots }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc_graph;
    use solbmc_ast::{ContractItem, ContractKind, Expr, StateVarDef, Type};

    fn leaf(name: &str) -> ContractDef {
        ContractDef { name: name.into(), kind: ContractKind::Contract, bases: vec![], body: vec![] }
    }

    fn owner_with_child(name: &str, field: &str, child_ty: &str) -> ContractDef {
        ContractDef {
            name: name.into(),
            kind: ContractKind::Contract,
            bases: vec![],
            body: vec![ContractItem::StateVar(StateVarDef {
                name: field.into(),
                ty: Type::Custom(child_ty.into()),
                initializer: Some(Expr::New { ty: Type::Custom(child_ty.into()), args: vec![] }),
            })],
        }
    }

    #[test]
    fn addresses_are_dense_unique_and_depth_first() {
        let grandchild = leaf("GrandChild");
        let child = owner_with_child("Child", "inner", "GrandChild");
        let root = owner_with_child("Root", "kid", "Child");

        let all: IndexMap<&str, &ContractDef> =
            [("Root", &root), ("Child", &child), ("GrandChild", &grandchild)].into_iter().collect();
        let pool = [&root, &child, &grandchild];
        let alloc = alloc_graph::build(&pool).unwrap();
        let flat_root = flatten(&[&root]);

        let tree = build(&[flat_root], &all, &alloc);
        assert_eq!(tree.size(), 3);

        let root_node = &tree.roots()[0];
        assert_eq!(root_node.address, 1);
        assert_eq!(root_node.children().len(), 1);
        let child_node = &root_node.children()[0];
        assert_eq!(child_node.address, 2);
        assert_eq!(child_node.var, "kid");
        let grandchild_node = &child_node.children()[0];
        assert_eq!(grandchild_node.address, 3);
        assert_eq!(grandchild_node.var, "inner");
    }

    #[test]
    fn leaf_contract_has_no_children() {
        let only = leaf("Only");
        let all: IndexMap<&str, &ContractDef> = [("Only", &only)].into_iter().collect();
        let alloc = alloc_graph::build(&[&only]).unwrap();
        let flat = flatten(&[&only]);
        let tree = build(&[flat], &all, &alloc);
        assert_eq!(tree.size(), 1);
        assert!(tree.roots()[0].children().is_empty());
    }
}
