//! Non-deterministic source dump (spec §4.11 "Nondet source registry"
//! emission): prints the body of every generated function the registry
//! issued, recursing structurally into compound record shapes.
//!
//! Grounded on `NondetSourceRegistry.cpp` in the reference tool: a
//! struct's `nd_val_*` body fills one field at a time by requesting a
//! nondet value for that field's type (possibly issuing its own
//! `nd_val_*` function in turn, which this dump picks up on a later
//! pass); an array's fills a bounded prefix — its static length if the
//! record name carries one, else `SOLBMC_DYNARR_BOUND` for a dynamic
//! array — and also picks its logical length from `rt_nd_range`; a
//! mapping's single `curr`/`data`/`nd` triple is seeded with one nondet
//! key and value.

use indexmap::IndexSet;
use solbmc_ast::Type;
use solbmc_analysis::nondet::NondetSourceRegistry;
use solbmc_analysis::types::escape_decl_name;

use crate::emitter::Emitter;
use crate::records::{lower_type_name, record_name, PendingRecord, RecordCatalog};

/// Prefix length of every fixed-size array bound baked into its own
/// record name when a field's length is statically known.
fn fixed_array_len(record: &str) -> Option<&str> {
    record.strip_prefix("arr_").and_then(|rest| rest.rsplit_once('_')).map(|(_, n)| n).filter(|n| n.chars().all(|c| c.is_ascii_digit()))
}

fn field_nondet_call(
    registry: &mut NondetSourceRegistry,
    catalog: &RecordCatalog<'_>,
    ty: &Type,
    bundle_size: u64,
    msg: &str,
) -> solbmc_analysis::nondet::NondetCall {
    registry.val(ty, || record_name(ty, &catalog.enum_names), bundle_size, msg.to_string())
}

/// Renders a [`solbmc_analysis::nondet::NondetCall`] as an emitted call
/// expression. Each distinct function family the registry can hand back
/// has its own fixed arity (spec §6 "Runtime library contract" for the
/// fixed runtime symbols; `nd_val_*` generated bodies take none, since
/// they have no caller-supplied message to report).
pub fn nondet_call_text(call: &solbmc_analysis::nondet::NondetCall, bundle_size: u64) -> String {
    let f = &call.function;
    if f == "rt_nd_range" {
        format!("rt_nd_range(0, {bundle_size}, \"{}\")", call.message)
    } else if f.starts_with("nd_val_") {
        format!("{f}()")
    } else {
        format!("{f}(\"{}\")", call.message)
    }
}

fn emit_fixed_increase_bodies(e: &mut Emitter, registry: &NondetSourceRegistry) {
    for name in registry.issued() {
        match name {
            "nd_increase" => {
                e.line("uint256_t nd_increase(uint256_t curr) {");
                e.indented(|e| {
                    e.line("uint256_t delta = rt_nd_range(0, SOLBMC_MAX_DELTA, \"monotonic increase\");");
                    e.line("return curr + delta;");
                });
                e.line("}");
                e.blank();
            }
            "nd_increase_strict" => {
                e.line("uint256_t nd_increase_strict(uint256_t curr) {");
                e.indented(|e| {
                    e.line("uint256_t delta = rt_nd_range(1, SOLBMC_MAX_DELTA, \"strict monotonic increase\");");
                    e.line("return curr + delta;");
                });
                e.line("}");
                e.blank();
            }
            _ => {}
        }
    }
}

fn emit_val_body(
    e: &mut Emitter,
    function: &str,
    registry: &mut NondetSourceRegistry,
    catalog: &RecordCatalog<'_>,
    bundle_size: u64,
) {
    let record = function.strip_prefix("nd_val_").unwrap_or(function).to_string();
    let Some(pending) = catalog.pending_entries().find(|(n, _)| n.as_str() == record).map(|(_, p)| p.clone()) else {
        return;
    };

    e.line(format!("struct {record} {function}(void) {{"));
    e.indented(|e| {
        e.line(format!("struct {record} result;"));
        match &pending {
            PendingRecord::Struct(def) => {
                for (field_name, field_ty) in &def.fields {
                    let call = field_nondet_call(registry, catalog, field_ty, bundle_size, field_name);
                    let text = nondet_call_text(&call, bundle_size);
                    e.line(format!("result.d_{} = {text};", escape_decl_name(field_name)));
                }
            }
            PendingRecord::Array { element } => {
                let elem_ty = lower_type_name(element, &catalog.enum_names);
                let bound = fixed_array_len(&record).map(str::to_string).unwrap_or_else(|| "SOLBMC_DYNARR_BOUND".to_string());
                e.line(format!("result.len = rt_nd_range(0, {bound}, \"array length\");"));
                e.line(format!("result.data = ({elem_ty} *)sol_alloc_array(sizeof({elem_ty}), {bound});"));
                e.line(format!("for (uint256_t i = 0; i < {bound}; ++i) {{"));
                e.indented(|e| {
                    let call = field_nondet_call(registry, catalog, element, bundle_size, "elem");
                    let text = nondet_call_text(&call, bundle_size);
                    e.line(format!("result.data[i] = {text};"));
                });
                e.line("}");
            }
            PendingRecord::Mapping { key, value } => {
                e.line("result.set = 0;");
                let key_call = field_nondet_call(registry, catalog, key, bundle_size, "key");
                let key_text = nondet_call_text(&key_call, bundle_size);
                e.line(format!("result.curr = {key_text};"));
                let val_call = field_nondet_call(registry, catalog, value, bundle_size, "val");
                let val_text = nondet_call_text(&val_call, bundle_size);
                e.line(format!("result.nd = {val_text};"));
                e.line("result.data = 0;");
            }
            PendingRecord::DynamicBytes => {
                e.line("result.len = rt_nd_range(0, SOLBMC_DYNARR_BOUND, \"byte length\");");
                e.line("result.data = (uint8_t *)sol_alloc_array(sizeof(uint8_t), SOLBMC_DYNARR_BOUND);");
                e.line("for (uint256_t i = 0; i < SOLBMC_DYNARR_BOUND; ++i) {");
                e.indented(|e| {
                    e.line("result.data[i] = rt_nd_byte(\"byte\");");
                });
                e.line("}");
            }
        }
        e.line("return result;");
    });
    e.line("}");
    e.blank();
}

/// Prints every body the registry has (or, while printing struct/array
/// bodies, comes to have) issued. Runs to a fixed point since a
/// compound field can issue its own `nd_val_*` function mid-pass.
pub fn emit(e: &mut Emitter, registry: &mut NondetSourceRegistry, catalog: &RecordCatalog<'_>, bundle_size: u64) {
    emit_fixed_increase_bodies(e, registry);

    let mut printed: IndexSet<String> = IndexSet::new();
    loop {
        let pending: Vec<String> =
            registry.issued().filter(|n| n.starts_with("nd_val_") && !printed.contains(*n)).map(str::to_string).collect();
        if pending.is_empty() {
            break;
        }
        for name in pending {
            printed.insert(name.clone());
            emit_val_body(e, &name, registry, catalog, bundle_size);
        }
    }
}
