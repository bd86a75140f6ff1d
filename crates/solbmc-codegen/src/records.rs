//! Record declarations (spec §4.12, first two emission steps): forward
//! declarations, then bodies, for the call-state record, one storage
//! record per distinct instantiated contract, and one record per
//! reachable struct and synthesized compound type.

use indexmap::{IndexMap, IndexSet};
use solbmc_ast::{ContractDef, FunctionDef, FunctionKind, StructDef, Type};
use solbmc_analysis::stack::AnalysisStack;
use solbmc_analysis::types::{escape_decl_name, is_simple_type, unwrap};

use crate::emitter::Emitter;
use crate::magic::CallStateField;
use crate::options::Options;

/// The C-like scalar type name a *simple* AST type lowers to (spec §4.6).
/// Panics if handed a compound type; callers must check
/// [`solbmc_analysis::types::is_simple_type`] first (or use
/// [`lower_type_name`], which does).
fn scalar_type_name(ty: &Type) -> String {
    match unwrap(ty) {
        Type::Address { .. } => "uint160_t".to_string(),
        Type::Bool => "sol_bool_t".to_string(),
        Type::Int(Some(width)) => format!("int{width}_t"),
        Type::Uint(Some(width)) => format!("uint{width}_t"),
        Type::FixedBytes(n) => format!("bytes{n}_t"),
        other => panic!("scalar_type_name called on a non-simple type: {other:?}"),
    }
}

/// The lowered record name for a compound type (spec §4.6 "assigns a
/// lowered record name to each compound type"). Struct and contract
/// references escape their source name (spec §4.6 `escape_decl_name`);
/// arrays, mappings, and tuples synthesize a deterministic name from
/// their element types so that two occurrences of the same shape always
/// share one record.
pub fn record_name(ty: &Type, enum_names: &IndexSet<String>) -> String {
    match unwrap(ty) {
        Type::String => "sol_string_t".to_string(),
        Type::Bytes => "sol_bytes_t".to_string(),
        Type::Custom(name) => format!("struct_{}", escape_decl_name(&name)),
        Type::Array { element, len } => {
            let elem = lower_type_name(&element, enum_names);
            match len {
                Some(n) => format!("arr_{elem}_{n}"),
                None => format!("dynarr_{elem}"),
            }
        }
        Type::Mapping { key, value } => {
            let k = lower_type_name(&key, enum_names);
            let v = lower_type_name(&value, enum_names);
            format!("map_{k}_{v}")
        }
        Type::Tuple(items) => {
            let parts: Vec<String> = items.iter().map(|t| lower_type_name(t, enum_names)).collect();
            format!("tuple_{}", parts.join("_"))
        }
        Type::Modifier => "sol_modifier_t".to_string(),
        Type::Magic(_) => "sol_call_state_t".to_string(),
        Type::Construction(name) => format!("struct_{}", escape_decl_name(&name)),
        other => panic!("record_name called on a simple type: {other:?}"),
    }
}

/// Lowers any AST type to its emitted C-like name: a scalar type for a
/// simple type (enums included, once resolved against `enum_names`), or
/// a record name otherwise.
pub fn lower_type_name(ty: &Type, enum_names: &IndexSet<String>) -> String {
    match unwrap(ty) {
        Type::Custom(name) if enum_names.contains(&name) => "uint8_t".to_string(),
        other if is_simple_type(&other) => scalar_type_name(&other),
        other => record_name(&other, enum_names),
    }
}

/// Qualifies a lowered function's emitted C symbol by its owning contract
/// and declared parameter types. Without this, two bundled contracts
/// that both declare a same-named function — or a single contract's own
/// overloads, which the flat-interface collision predicate (spec §4.3
/// `SignatureCollision`) deliberately keeps distinct — would lower to
/// one C symbol. Grounded on `to_c_method_name` in the reference tool's
/// `FunctionDefinitionGenerator.cpp` (`Method_<contract>_<method>` /
/// `Ctor_<contract>`), extended with a parameter-type suffix since this
/// translator keeps genuine overloads distinct rather than collapsing
/// them to the reference tool's one symbol per name.
pub fn mangled_fn_name(contract: &str, f: &FunctionDef, enum_names: &IndexSet<String>) -> String {
    if f.kind == FunctionKind::Constructor {
        return format!("Ctor_{}", escape_decl_name(contract));
    }
    let mut name = format!("Method_{}_{}", escape_decl_name(contract), escape_decl_name(f.dispatch_name()));
    for p in &f.params {
        name.push('_');
        name.push_str(&lower_type_name(&p.ty, enum_names));
    }
    name
}

/// One compound record still awaiting a body: either a named struct
/// lifted straight from the AST, or a synthesized array/mapping/string
/// shape described only by its lowered name and element types.
#[derive(Debug, Clone)]
pub(crate) enum PendingRecord<'ast> {
    Struct(&'ast StructDef),
    Array { element: Type },
    Mapping { key: Type, value: Type },
    DynamicBytes,
}

/// Gathers every enum name declared across `contracts`, used to resolve
/// `Type::Custom` references that are simple (enum) rather than compound
/// (struct/contract).
fn collect_enum_names<'ast>(contracts: impl IntoIterator<Item = &'ast ContractDef>) -> IndexSet<String> {
    let mut names = IndexSet::new();
    for contract in contracts {
        for e in contract.enums() {
            names.insert(e.name.clone());
        }
    }
    names
}

/// Builds the deterministic catalogue of records this model needs, plus
/// the enum-name set, from every distinct contract reachable in the
/// tight bundle and the library summary.
///
/// Known scope limitation (documented in `DESIGN.md`): a struct or enum
/// declared only inside a contract that is never instantiated and never
/// owns a reachable function is not discovered here. Every struct/enum
/// reachable from an allocated contract's own state, or from a called
/// library's own state, is covered.
pub struct RecordCatalog<'ast> {
    pub enum_names: IndexSet<String>,
    /// One entry per distinct contract name, in first-encountered
    /// (tight-bundle, then library) order.
    contracts: Vec<&'ast ContractDef>,
    /// One entry per distinct lowered record name, in the order its need
    /// was first discovered while walking contract state and struct
    /// fields.
    pending: IndexMap<String, PendingRecord<'ast>>,
}

impl<'ast> RecordCatalog<'ast> {
    pub fn build(stack: &AnalysisStack<'ast>) -> Self {
        let mut contracts: IndexMap<&str, &'ast ContractDef> = IndexMap::new();
        for root in stack.tight_bundle.roots() {
            collect_contracts(root, &mut contracts);
        }
        for lib in stack.library_summary.view() {
            contracts.entry(lib.source.name.as_str()).or_insert(lib.source);
        }

        let enum_names = collect_enum_names(contracts.values().copied());

        let mut catalog =
            Self { enum_names, contracts: contracts.values().copied().collect(), pending: IndexMap::new() };
        catalog.discover_all();
        catalog
    }

    fn register(&mut self, ty: &Type) {
        if is_simple_type(ty) {
            return;
        }
        let unwrapped = unwrap(ty);
        if let Type::Custom(name) = &unwrapped {
            if self.enum_names.contains(name) {
                return;
            }
        }
        let name = record_name(&unwrapped, &self.enum_names);
        if self.pending.contains_key(&name) {
            return;
        }
        match &unwrapped {
            Type::Custom(struct_name) => {
                if let Some(def) = self.find_struct(struct_name) {
                    self.pending.insert(name, PendingRecord::Struct(def));
                    let fields: Vec<Type> = def.fields.iter().map(|(_, ty)| ty.clone()).collect();
                    for field_ty in fields {
                        self.register(&field_ty);
                    }
                }
                // A contract-typed field (a nested instance pointer) needs
                // no record of its own: it is emitted as a pointer to the
                // contract's own storage record, not a fresh shape.
            }
            Type::Array { element, .. } => {
                self.pending.insert(name, PendingRecord::Array { element: (**element).clone() });
                self.register(element);
            }
            Type::Mapping { key, value } => {
                self.pending.insert(name, PendingRecord::Mapping { key: (**key).clone(), value: (**value).clone() });
                self.register(key);
                self.register(value);
            }
            Type::String | Type::Bytes => {
                self.pending.insert(name, PendingRecord::DynamicBytes);
            }
            _ => {}
        }
    }

    fn find_struct(&self, name: &str) -> Option<&'ast StructDef> {
        self.contracts.iter().find_map(|c| c.structs().find(|s| s.name == name))
    }

    fn discover_all(&mut self) {
        let contracts = self.contracts.clone();
        for contract in &contracts {
            for var in contract.state_vars() {
                self.register(&var.ty);
            }
            for s in contract.structs() {
                for (_, ty) in &s.fields {
                    self.register(ty);
                }
            }
            for f in contract.functions() {
                for p in f.params.iter().chain(f.returns.iter()) {
                    self.register(&p.ty);
                }
            }
        }
    }

    pub fn contracts(&self) -> &[&'ast ContractDef] {
        &self.contracts
    }

    /// Every pending record, in discovery order; used by the non-deterministic
    /// source dump (`nondet_dump`) to synthesize structural `nd_val_*` bodies
    /// for compound types without re-walking the AST.
    pub(crate) fn pending_entries(&self) -> impl Iterator<Item = (&String, &PendingRecord<'ast>)> {
        self.pending.iter()
    }
}

fn collect_contracts<'ast>(
    node: &solbmc_analysis::tight_bundle::BundleContract<'ast>,
    out: &mut IndexMap<&'ast str, &'ast ContractDef>,
) {
    out.entry(node.contract.source.name.as_str()).or_insert(node.contract.source);
    for child in node.children() {
        collect_contracts(child, out);
    }
}

/// Emits the call-state record's body (spec §6 "Emitted state layout").
pub fn emit_call_state(emitter: &mut Emitter, opts: &Options) {
    if opts.forward_declare {
        emitter.line("struct CallState;");
        return;
    }
    emitter.line("struct CallState {");
    emitter.indented(|e| {
        for field in CallStateField::all() {
            e.line(format!("{} {};", field.scalar_type(), field.field_name()));
        }
    });
    emitter.line("};");
}

/// Emits one storage record's body for `contract` (spec §3 "Contract
/// records": `d_address`, `d_balance`, then one field per merged state
/// variable).
pub fn emit_contract_record(
    emitter: &mut Emitter,
    contract: &ContractDef,
    flat_vars: &[&solbmc_ast::StateVarDef],
    catalog: &RecordCatalog<'_>,
    opts: &Options,
) {
    let record = format!("struct_{}", escape_decl_name(&contract.name));
    if opts.forward_declare {
        emitter.line(format!("struct {record};"));
        return;
    }
    emitter.line(format!("struct {record} {{"));
    emitter.indented(|e| {
        e.line("uint160_t *d_address;");
        e.line("uint256_t d_balance;");
        if opts.add_sums {
            e.line("uint256_t d_balance_sum;");
        }
        for var in flat_vars {
            let ty = lower_type_name(&var.ty, &catalog.enum_names);
            let is_contract_ptr = matches!(unwrap(&var.ty), Type::Custom(name) if !catalog.enum_names.contains(&name) && catalog.find_struct(&name).is_none());
            if is_contract_ptr {
                e.line(format!("struct struct_{} *d_{};", escape_decl_name(&var.name), escape_decl_name(&var.name)));
            } else {
                e.line(format!("{ty} d_{};", escape_decl_name(&var.name)));
            }
        }
    });
    emitter.line("};");
}

/// Emits every pending compound record's body, in discovery order (spec
/// §6 "Mapping records": `set`, `curr`, `data`, `nd`; structs get one
/// field per source field; dynamic bytes/strings get a length-prefixed
/// byte array).
pub fn emit_pending_records(emitter: &mut Emitter, catalog: &RecordCatalog<'_>, opts: &Options) {
    for (name, pending) in &catalog.pending {
        if opts.forward_declare {
            emitter.line(format!("struct {name};"));
            continue;
        }
        emitter.line(format!("struct {name} {{"));
        emitter.indented(|e| match pending {
            PendingRecord::Struct(def) => {
                for (field_name, field_ty) in &def.fields {
                    let ty = lower_type_name(field_ty, &catalog.enum_names);
                    e.line(format!("{ty} d_{};", escape_decl_name(field_name)));
                }
            }
            PendingRecord::Array { element } => {
                let elem = lower_type_name(element, &catalog.enum_names);
                e.line(format!("{elem} *data;"));
                e.line("uint256_t len;");
            }
            PendingRecord::Mapping { key, value } => {
                let k = lower_type_name(key, &catalog.enum_names);
                let v = lower_type_name(value, &catalog.enum_names);
                e.line(format!("sol_bool_t set;"));
                e.line(format!("{k} curr;"));
                e.line(format!("{v} *data;"));
                e.line(format!("{v} nd;"));
            }
            PendingRecord::DynamicBytes => {
                e.line("uint8_t *data;");
                e.line("uint256_t len;");
            }
        });
        emitter.line("};");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_names_match_width_and_signedness() {
        assert_eq!(scalar_type_name(&Type::Uint(Some(256))), "uint256_t");
        assert_eq!(scalar_type_name(&Type::Int(Some(8))), "int8_t");
        assert_eq!(scalar_type_name(&Type::Bool), "sol_bool_t");
        assert_eq!(scalar_type_name(&Type::Address { payable: true }), "uint160_t");
    }

    #[test]
    fn mangled_name_disambiguates_overloads_and_contracts() {
        use solbmc_ast::{Param, Visibility};

        let enums = IndexSet::new();
        let f_u256 = FunctionDef {
            kind: FunctionKind::Function,
            name: Some("f".into()),
            visibility: Visibility::Public,
            params: vec![Param { name: Some("x".into()), ty: Type::Uint(Some(256)) }],
            returns: vec![],
            modifiers: vec![],
            body: Some(solbmc_ast::Stmt::Block(vec![])),
            super_function: None,
        };
        let f_bool = FunctionDef { params: vec![Param { name: Some("x".into()), ty: Type::Bool }], ..f_u256.clone() };
        assert_ne!(mangled_fn_name("A", &f_u256, &enums), mangled_fn_name("A", &f_bool, &enums));
        assert_ne!(mangled_fn_name("A", &f_u256, &enums), mangled_fn_name("B", &f_u256, &enums));

        let ctor = FunctionDef { kind: FunctionKind::Constructor, name: None, params: vec![], ..f_u256 };
        assert_eq!(mangled_fn_name("A", &ctor, &enums), "Ctor_A");
    }

    #[test]
    fn mapping_record_name_is_deterministic_and_shared() {
        let enums = IndexSet::new();
        let m1 = Type::Mapping {
            key: Box::new(Type::Address { payable: false }),
            value: Box::new(Type::Uint(Some(256))),
        };
        let m2 = Type::Mapping {
            key: Box::new(Type::Address { payable: false }),
            value: Box::new(Type::Uint(Some(256))),
        };
        assert_eq!(record_name(&m1, &enums), record_name(&m2, &enums));
        assert_eq!(record_name(&m1, &enums), "map_uint160_t_uint256_t");
    }
}
