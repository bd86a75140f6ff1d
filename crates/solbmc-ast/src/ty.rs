use serde::{Deserialize, Serialize};

use crate::ident::Ident;

/// A magic global's kind, as resolved by the frontend.
///
/// Solidity exposes a handful of implicitly-declared globals (`block`,
/// `msg`, `tx`) whose members carry call-state values. The frontend tags
/// their static type with one of these kinds rather than a user type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagicKind {
    /// `block`.
    Block,
    /// `msg`.
    Msg,
    /// `tx`.
    Tx,
}

/// A type name as it appears in the source AST.
///
/// This is surface syntax only: whether a given `Type` is simple or
/// compound, and what lowered record name a compound type gets, is decided
/// downstream by the type analyser, not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// `address` / `address payable`.
    Address { payable: bool },
    /// `bool`.
    Bool,
    /// `string`.
    String,
    /// `bytes` (dynamically sized).
    Bytes,
    /// `bytesN` for a literal `1..=32`.
    FixedBytes(u16),
    /// `intN`; `None` means the frontend left the width unresolved (e.g. a
    /// literal still carrying its "rational" pseudo-type).
    Int(Option<u16>),
    /// `uintN`; see [`Type::Int`].
    Uint(Option<u16>),
    /// `T[]` or `T[N]`.
    Array { element: Box<Type>, len: Option<u64> },
    /// `(T1, T2, ...)`.
    Tuple(Vec<Type>),
    /// `mapping(K => V)`.
    Mapping { key: Box<Type>, value: Box<Type> },
    /// A reference to a contract, interface, struct, or enum definition by
    /// name; which one it is is resolved by looking the name up in the
    /// enclosing source unit.
    Custom(Ident),
    /// A modifier's synthetic "type" (modifiers are not values, but the
    /// frontend still type-tags modifier-invocation expressions).
    Modifier,
    /// The type of `block`, `msg`, or `tx`.
    Magic(MagicKind),
    /// The pseudo-type of a bare contract name used as a constructor,
    /// e.g. the `Foo` in `new Foo(...)`.
    Construction(Ident),
}
