//! Ether helpers (spec §4.12 "Ether helpers"): `transfer`/`send`/`pay`,
//! plus the recipient-dispatch path that walks the tight bundle to find
//! which (if any) instance a destination address names.
//!
//! Grounded on `Ether.h` in the reference tool: balance updates are
//! unconditional and atomic with recipient dispatch; `transfer` differs
//! from `send` only in whether a failed dispatch reverts (`sol_require`)
//! or yields a boolean the caller can check.

use solbmc_analysis::tight_bundle::{BundleContract, TightBundleTree};
use solbmc_analysis::types::escape_decl_name;

use crate::emitter::Emitter;

fn emit_dispatch_for(e: &mut Emitter, node: &BundleContract<'_>) {
    let record = format!("struct_{}", escape_decl_name(&node.contract.source.name));
    e.line(format!("if (to == {}) {{", node.address));
    e.indented(|e| {
        e.line(format!("struct {record} *target = ({record} *)sol_address_lookup(to);"));
        if node.contract.source.fallback().is_some() {
            e.line("sol_fallback(target, state);");
        }
        e.line("return 1;");
    });
    e.line("}");
    for child in node.children() {
        emit_dispatch_for(e, child);
    }
}

/// Emits the shared recipient-dispatch helper: given a destination
/// address, invokes its bundled instance's fallback (if any). Returns 1
/// if the address resolved to a known instance, 0 otherwise (an
/// external/EOA recipient, represented only by its balance entry).
pub fn emit_dispatch(e: &mut Emitter, tight_bundle: &TightBundleTree<'_>) {
    e.line("static int sol_dispatch_receive(uint160_t to, struct CallState *state) {");
    e.indented(|e| {
        for root in tight_bundle.roots() {
            emit_dispatch_for(e, root);
        }
        e.line("return 0;");
    });
    e.line("}");
}

/// Emits `sol_transfer`/`sol_send`/`sol_pay`, the three Ether-movement
/// primitives spec §4.12 groups together. `g_balance` is the global
/// address-indexed balance table the address-space initialiser allocates
/// (spec §4.10).
pub fn emit_helpers(e: &mut Emitter) {
    e.line("void sol_transfer(struct CallState *state, uint160_t from, uint160_t to, uint256_t amount) {");
    e.indented(|e| {
        e.line("sol_require(g_balance[from] >= amount, \"insufficient balance for transfer\");");
        e.line("g_balance[from] -= amount;");
        e.line("g_balance[to] += amount;");
        e.line("sol_dispatch_receive(to, state);");
    });
    e.line("}");
    e.blank();

    e.line("sol_bool_t sol_send(struct CallState *state, uint160_t from, uint160_t to, uint256_t amount) {");
    e.indented(|e| {
        e.line("if (g_balance[from] < amount) { return 0; }");
        e.line("g_balance[from] -= amount;");
        e.line("g_balance[to] += amount;");
        e.line("sol_dispatch_receive(to, state);");
        e.line("return 1;");
    });
    e.line("}");
    e.blank();

    e.line("void sol_pay(struct CallState *state, uint160_t to, uint256_t amount) {");
    e.indented(|e| {
        e.line("g_balance[to] += amount;");
        e.line("state->paid = 1;");
    });
    e.line("}");
}
