//! Stage 8: the type analyser (spec §4.6).
//!
//! Grounded verbatim on `TypeClassification.h`/`MapDepthCalculator.{h,cpp}`
//! in the reference tool: `is_simple_type`, `has_simple_type`, and
//! `escape_decl_name` are direct translations of those declarations, and
//! `map_depth` is a direct translation of `MapDepthCalculator`'s AST walk.

use solbmc_ast::{Expr, Type};

/// A classified type: either a scalar that embeds directly into a record
/// field, or a compound type that gets its own lowered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeClass {
    /// A scalar. `width` is in bits; `signed` distinguishes `int`/`uint`
    /// and is meaningless for non-integer scalars.
    Simple { width: u16, signed: bool },
    /// A compound type, named by its assigned lowered record name.
    Compound { record_name: String },
}

/// Strips a type-of-type wrapper (the pseudo-type of a bare type name used
/// in `new T(...)` or `type(T)`) and resolves an unsized rational literal
/// to its storage type. Solidity infers a literal's width from usage
/// context; lacking that context here, unsized integers widen to the
/// maximum representable width (256 bits), which is always a sound
/// over-approximation for the model's storage fields.
pub fn unwrap(ty: &Type) -> Type {
    match ty {
        Type::Construction(name) => Type::Custom(name.clone()),
        Type::Int(None) => Type::Int(Some(256)),
        Type::Uint(None) => Type::Uint(Some(256)),
        other => other.clone(),
    }
}

/// True if `ty` is simple (scalar-embeddable) rather than compound, per
/// spec §4.6. Applies [`unwrap`] first.
pub fn is_simple_type(ty: &Type) -> bool {
    match unwrap(ty) {
        Type::Address { .. }
        | Type::Bool
        | Type::Int(_)
        | Type::Uint(_)
        | Type::FixedBytes(_) => true,
        Type::Custom(_) => false, // contracts, structs, and enums are resolved by the caller; see `has_simple_type`.
        _ => false,
    }
}

/// Like [`is_simple_type`], but additionally recognises an enum-typed
/// `Custom` reference as simple once the caller has resolved that the name
/// refers to an enum rather than a struct or contract.
pub fn is_simple_resolved(ty: &Type, is_enum: impl Fn(&str) -> bool) -> bool {
    match unwrap(ty) {
        Type::Custom(name) => is_enum(&name),
        other => is_simple_type(&other),
    }
}

/// Extracts the static type of an expression node, delegating to the
/// expression-type table built by the expression analyser. `ty_of` must
/// return the expression's resolved static type; this function exists so
/// callers that already have a type-of-expression oracle can reuse
/// [`is_simple_type`] uniformly across declarations, type names, and
/// expressions (spec's three `has_simple_type` overloads).
pub fn has_simple_type(ty_of: impl FnOnce() -> Type) -> bool {
    is_simple_type(&ty_of())
}

/// Recursively counts nested `mapping` value types (spec §4.6).
/// `mapping(uint => uint)` has depth 1; non-mapping types have depth 0.
pub fn map_depth(ty: &Type) -> usize {
    match ty {
        Type::Mapping { value, .. } => 1 + map_depth(value),
        _ => 0,
    }
}

/// Rewrites `name` so that every run of consecutive underscores is doubled
/// in length. This makes the escaping injective: doubling is itself
/// injective in the run length (`2*n1 == 2*n2` iff `n1 == n2`), so two
/// distinct source names can never collide after escaping, and every
/// escaped run is guaranteed even length.
pub fn escape_decl_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    let mut run = 0usize;
    let flush = |out: &mut String, run: usize| {
        for _ in 0..run * 2 {
            out.push('_');
        }
    };
    for ch in name.chars() {
        if ch == '_' {
            run += 1;
        } else {
            flush(&mut out, run);
            run = 0;
            out.push(ch);
        }
    }
    flush(&mut out, run);
    out
}

/// True if an address-typed expression participates in one of the three
/// map-index violation kinds when used as `expr`. Exposed here (rather
/// than only in [`crate::map_index`]) because both modules need the same
/// "is this an address value" check, derived from [`is_simple_type`] plus
/// a literal `Type::Address` match.
pub fn is_address_typed(ty: &Type) -> bool {
    matches!(unwrap(ty), Type::Address { .. })
}

/// Re-exported so callers doing ad hoc expression matching (the map-index
/// summary, the call graph's `new` handling) don't need to import
/// `solbmc_ast::Expr` separately just for this one pattern.
pub fn is_new_expr(expr: &Expr) -> bool {
    matches!(expr, Expr::New { .. })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_vs_compound() {
        assert!(is_simple_type(&Type::Address { payable: false }));
        assert!(is_simple_type(&Type::Uint(Some(256))));
        assert!(is_simple_type(&Type::Bool));
        assert!(!is_simple_type(&Type::String));
        assert!(!is_simple_type(&Type::Bytes));
        assert!(!is_simple_type(&Type::Array { element: Box::new(Type::Uint(Some(8))), len: None }));
        assert!(!is_simple_type(&Type::Mapping {
            key: Box::new(Type::Address { payable: false }),
            value: Box::new(Type::Uint(Some(256)))
        }));
    }

    #[test]
    fn rational_literal_unwraps_to_256() {
        assert_eq!(unwrap(&Type::Uint(None)), Type::Uint(Some(256)));
        assert!(is_simple_type(&Type::Uint(None)));
    }

    #[test]
    fn map_depth_counts_nesting() {
        let inner = Type::Mapping {
            key: Box::new(Type::Uint(Some(256))),
            value: Box::new(Type::Uint(Some(256))),
        };
        let outer = Type::Mapping { key: Box::new(Type::Uint(Some(256))), value: Box::new(inner.clone()) };
        let deepest = Type::Mapping { key: Box::new(Type::Uint(Some(256))), value: Box::new(outer.clone()) };
        assert_eq!(map_depth(&Type::Uint(Some(256))), 0);
        assert_eq!(map_depth(&inner), 1);
        assert_eq!(map_depth(&outer), 2);
        assert_eq!(map_depth(&deepest), 3);
        let struct_valued = Type::Mapping {
            key: Box::new(Type::Uint(Some(256))),
            value: Box::new(Type::Custom("Widget".into())),
        };
        assert_eq!(map_depth(&struct_valued), 1);
    }

    #[test]
    fn escape_name_injective_on_underscore_runs() {
        assert_eq!(escape_decl_name("plain"), "plain");
        assert_eq!(escape_decl_name("a_b"), "a__b");
        assert_eq!(escape_decl_name("a__b"), "a____b");
        assert_eq!(escape_decl_name("a___b"), "a______b");
        // distinct source names must never collide after escaping
        assert_ne!(escape_decl_name("a_b"), escape_decl_name("ab"));
        assert_ne!(escape_decl_name("a_b"), escape_decl_name("a__b"));
        assert_ne!(escape_decl_name("a_b"), escape_decl_name("a__b_"));
    }
}
