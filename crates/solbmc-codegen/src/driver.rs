//! The model-checking harness driver (spec §4.12, final emission step):
//! declares the call state and every tight-bundle contract instance, then
//! loops picking a non-deterministic instance and one of its dispatchable
//! functions to call with non-deterministic arguments, advancing the call
//! state's monotonic fields between iterations.
//!
//! Grounded on the reference tool's `scheduler/Schedule.cpp` harness
//! loop: one shared `CallState`, a bounded `for` over a fixed step count
//! (the verification horizon), and a per-iteration non-deterministic
//! (instance, function, args) choice translated as a cascade of `if`s
//! over nondet-selected indices. `--lockstep-time` (spec §6) shares one
//! step counter across every instance's `blocknum`/`timestamp` instead of
//! letting each call draw its own via [`solbmc_analysis::nondet`].

use solbmc_analysis::nondet::NondetSourceRegistry;
use solbmc_analysis::tight_bundle::{BundleContract, TightBundleTree};
use solbmc_analysis::types::escape_decl_name;

use crate::emitter::Emitter;
use crate::nondet_dump::nondet_call_text;
use crate::options::Options;
use crate::records::RecordCatalog;

fn collect_instances<'a, 'ast>(node: &'a BundleContract<'ast>, out: &mut Vec<&'a BundleContract<'ast>>) {
    out.push(node);
    for child in node.children() {
        collect_instances(child, out);
    }
}

fn emit_instance_decls(e: &mut Emitter, instances: &[&BundleContract<'_>]) {
    for inst in instances {
        let record = format!("struct_{}", escape_decl_name(&inst.contract.source.name));
        e.line(format!("static struct {record} g_instance_{};", inst.address));
    }
}

fn emit_call_state_advance(e: &mut Emitter, registry: &mut NondetSourceRegistry, opts: &Options) {
    if opts.lockstep_time {
        e.line("g_state.blocknum = step;");
        e.line("g_state.timestamp = step;");
    } else {
        // Requested through the registry (rather than written as raw
        // text) so `nondet_dump::emit_fixed_increase_bodies` knows
        // `nd_increase` was actually issued and prints its body.
        let blocknum_call = registry.increase(false, "block number advance");
        e.line(format!("g_state.blocknum = {}(g_state.blocknum);", blocknum_call.function));
        let timestamp_call = registry.increase(false, "timestamp advance");
        e.line(format!("g_state.timestamp = {}(g_state.timestamp);", timestamp_call.function));
    }
}

/// Emits one instance's inner dispatch cascade: one `if` per dispatchable
/// (public, implemented) function in its flat interface, each filling its
/// declared parameters from the registry before calling in the fixed
/// `(self, state, ...params)` convention (spec §6 "Emitted functions").
fn emit_instance_dispatch(
    e: &mut Emitter,
    inst: &BundleContract<'_>,
    registry: &mut NondetSourceRegistry,
    catalog: &RecordCatalog<'_>,
    bundle_size: u64,
) {
    let record = format!("struct_{}", escape_decl_name(&inst.contract.source.name));
    e.line(format!("if (inst_sel == {}) {{", inst.address));
    e.indented(|e| {
        for (idx, method) in inst.contract.methods().iter().enumerate() {
            let Some(_) = &method.body else { continue };
            e.line(format!("if (fn_sel == {idx}) {{"));
            e.indented(|e| {
                let mut arg_names = Vec::new();
                for (i, param) in method.params.iter().enumerate() {
                    let arg = format!("arg{i}");
                    let ty = crate::records::lower_type_name(&param.ty, &catalog.enum_names);
                    let call = registry.val(&param.ty, || crate::records::record_name(&param.ty, &catalog.enum_names), bundle_size, param.name.clone().unwrap_or_default());
                    let text = nondet_call_text(&call, bundle_size);
                    e.line(format!("{ty} {arg} = {text};"));
                    arg_names.push(arg);
                }
                e.line("struct CallState call_state = g_state;");
                let sender_call = registry.address(bundle_size, "sender".to_string());
                let sender_text = nondet_call_text(&sender_call, bundle_size);
                e.line(format!("call_state.sender = {sender_text};"));
                e.line("call_state.value = rt_nd_range(0, SOLBMC_MAX_VALUE, \"call value\");");
                let mut call_args = vec![format!("&g_instance_{}", inst.address), "&call_state".to_string()];
                call_args.extend(arg_names);
                let mangled = crate::records::mangled_fn_name(&inst.contract.source.name, method, &catalog.enum_names);
                e.line(format!("{mangled}({});", call_args.join(", ")));
            });
            e.line("}");
        }
    });
    e.line("}");
}

/// Emits the global call state, every instance, and the harness `main`
/// loop (spec §4.12 last emission step).
pub fn emit(
    e: &mut Emitter,
    tight_bundle: &TightBundleTree<'_>,
    registry: &mut NondetSourceRegistry,
    catalog: &RecordCatalog<'_>,
    opts: &Options,
) {
    let mut instances = Vec::new();
    for root in tight_bundle.roots() {
        collect_instances(root, &mut instances);
    }
    let bundle_size = tight_bundle.size();

    e.line("struct CallState g_state;");
    emit_instance_decls(e, &instances);
    e.blank();

    e.line("int main(void) {");
    e.indented(|e| {
        e.line("sol_init_address_space();");
        e.line("g_state.blocknum = 0;");
        e.line("g_state.timestamp = 0;");
        e.line("for (uint256_t step = 0; step < SOLBMC_STEP_BOUND; ++step) {");
        e.indented(|e| {
            emit_call_state_advance(e, registry, opts);
            e.line(format!("uint256_t inst_sel = rt_nd_range(0, {}, \"instance select\");", instances.len()));
            e.line("uint256_t fn_sel = rt_nd_range(0, SOLBMC_MAX_FUNCTIONS, \"function select\");");
            for inst in &instances {
                emit_instance_dispatch(e, inst, registry, catalog, bundle_size);
            }
        });
        e.line("}");
        e.line("return 0;");
    });
    e.line("}");
}
