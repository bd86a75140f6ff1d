//! Stage (spec §4.11): the non-deterministic source registry.
//!
//! Emits one uniquely-named non-deterministic function per (type, purpose)
//! pair encountered during code generation, and remembers, in first-seen
//! order, every such function it has issued so the emitter can print all of
//! their bodies once translation completes. Grounded on
//! `NondetSourceRegistry` in the reference tool's
//! `model/NondetSourceRegistry.h`; `byte`/`range` forward directly to the
//! fixed runtime symbols of spec §6 (`rt_nd_byte`, `rt_nd_range`) rather
//! than issuing new functions, since those primitives are already part of
//! the runtime library contract.

use indexmap::IndexSet;
use solbmc_ast::Type;

use crate::types::unwrap;

/// A call into a non-deterministic source: the function to invoke and its
/// runtime arguments (already-lowered expression text is the emitter's
/// concern; this only names the call and its scalar/string arguments).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NondetCall {
    pub function: String,
    pub message: String,
}

/// Tracks every distinct generated-function name this registry has issued,
/// in the order first requested. `byte`/`range` calls never add an entry
/// here (they call fixed runtime symbols); `increase`/`val` do, the first
/// time each distinct variant is requested.
#[derive(Debug, Default)]
pub struct NondetSourceRegistry {
    issued: IndexSet<String>,
}

impl NondetSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single non-deterministic byte, described by `msg`.
    pub fn byte(&self, msg: impl Into<String>) -> NondetCall {
        NondetCall { function: "rt_nd_byte".to_string(), message: msg.into() }
    }

    /// A non-deterministic value in `[l, u)`, described by `msg`.
    pub fn range(&self, _l: u64, _u: u64, msg: impl Into<String>) -> NondetCall {
        NondetCall { function: "rt_nd_range".to_string(), message: msg.into() }
    }

    /// A non-deterministic address in `[0, bundle_size]`, used by `val`
    /// when the requested type is an address (spec §4.11).
    pub fn address(&self, bundle_size: u64, msg: impl Into<String>) -> NondetCall {
        self.range(0, bundle_size, msg)
    }

    /// A value at least as large as `curr` (strictly greater if `strict`).
    /// Used for monotonic fields such as block number. This has no direct
    /// runtime-library primitive, so the registry issues a generated helper
    /// and remembers it; the two boolean variants are the only distinct
    /// identities this operation can have, so at most two functions are
    /// ever issued program-wide.
    pub fn increase(&mut self, strict: bool, msg: impl Into<String>) -> NondetCall {
        let function = if strict { "nd_increase_strict" } else { "nd_increase" }.to_string();
        self.issued.insert(function.clone());
        NondetCall { function, message: msg.into() }
    }

    /// A non-deterministic value for `ty`, described by `msg`. Dispatches
    /// on the type tag: addresses resolve through [`Self::address`];
    /// fixed-width scalars resolve to the runtime's `nd_intN_t`/`nd_uintN_t`
    /// family directly (no new function needed, the width selects the
    /// symbol); every other (necessarily compound, per
    /// [`crate::types::is_simple_type`]) type gets its own generated
    /// `nd_val_<record-name>` function that the emitter fills in by
    /// recursing structurally over the type's fields/elements.
    pub fn val(&mut self, ty: &Type, record_name: impl Fn() -> String, bundle_size: u64, msg: impl Into<String>) -> NondetCall {
        let msg = msg.into();
        match unwrap(ty) {
            Type::Address { .. } => self.address(bundle_size, msg),
            Type::Bool => NondetCall { function: "rt_nd_byte".to_string(), message: msg },
            Type::Int(Some(width)) => NondetCall { function: format!("nd_int{width}_t"), message: msg },
            Type::Uint(Some(width)) => NondetCall { function: format!("nd_uint{width}_t"), message: msg },
            _ => {
                let function = format!("nd_val_{}", record_name());
                self.issued.insert(function.clone());
                NondetCall { function, message: msg }
            }
        }
    }

    /// Every distinct generated function this registry has issued, in
    /// first-seen order; the emitter prints exactly these bodies at the end
    /// of translation.
    pub fn issued(&self) -> impl Iterator<Item = &str> {
        self.issued.iter().map(String::as_str)
    }
}
