//! Code-generation options (spec §6 CLI flags), decoupled from the CLI
//! crate's argument parser so this crate stays usable without `clap` in
//! the dependency graph of anyone embedding it directly.

/// Knobs that change what [`crate::generate`] emits, one per spec §6 flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Emit only forward declarations (record/function prototypes), no
    /// bodies. Used to generate a header-only view of the model.
    pub forward_declare: bool,
    /// Bounds every mapping's key alphabet to this width (spec §4.13);
    /// `None` leaves mappings unbounded (a single non-deterministic
    /// `curr`/`data`/`nd` triple per mapping record, spec §6).
    pub map_k: Option<usize>,
    /// Advances every contract instance's clock in lockstep via one shared
    /// step variable, rather than letting `blocknum`/`timestamp` drift
    /// independently per call (spec §6).
    pub lockstep_time: bool,
    /// Adds a running `d_balance_sum` field to every storage record and
    /// keeps it updated alongside `d_balance` (spec §6); used by
    /// downstream properties that reason about aggregate Ether conserved
    /// across a contract's lifetime.
    pub add_sums: bool,
}
