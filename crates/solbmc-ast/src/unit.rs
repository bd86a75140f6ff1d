use serde::{Deserialize, Serialize};

use crate::contract::ContractDef;

/// One deserialized source document handed to the translator by the
/// frontend. A translation run may load several of these (spec §6,
/// "one or more ASTs"); the analysis stack treats them as a single pool of
/// contract definitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub contracts: Vec<ContractDef>,
}

impl SourceUnit {
    /// Merges several source units into one contract pool, preserving the
    /// order in which they were given and the order of contracts within
    /// each. Duplicate names are left for the bundle extractor to notice.
    pub fn merge(units: impl IntoIterator<Item = SourceUnit>) -> SourceUnit {
        let mut contracts = Vec::new();
        for unit in units {
            contracts.extend(unit.contracts);
        }
        SourceUnit { contracts }
    }
}
