use serde::{Deserialize, Serialize};

use crate::{expr::Expr, function::FunctionDef, ident::Ident, ty::Type};

/// Distinguishes a contract definition from a library or an interface.
/// Libraries and interfaces are never bundled directly (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    Contract,
    Library,
    Interface,
}

/// A state variable declaration, with its optional initialiser.
///
/// `new T(...)` in `initializer` is how the allocation graph (§4.2)
/// discovers most construction sites that aren't in a constructor body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateVarDef {
    pub name: Ident,
    pub ty: Type,
    pub initializer: Option<Expr>,
}

/// A `struct` definition: an ordered list of named fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: Ident,
    pub fields: Vec<(Ident, Type)>,
}

/// An `enum` definition: an ordered list of variant names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: Ident,
    pub variants: Vec<Ident>,
}

/// One member of a contract body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ContractItem {
    StateVar(StateVarDef),
    Struct(StructDef),
    Enum(EnumDef),
    Function(FunctionDef),
}

/// A contract, library, or interface definition.
///
/// `bases` is the frontend-linearized list of base contracts, most-derived
/// first (spec §3's `ContractDescriptor`); this crate never re-sorts it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractDef {
    pub name: Ident,
    pub kind: ContractKind,
    pub bases: Vec<Ident>,
    pub body: Vec<ContractItem>,
}

impl ContractDef {
    pub fn state_vars(&self) -> impl Iterator<Item = &StateVarDef> {
        self.body.iter().filter_map(|item| match item {
            ContractItem::StateVar(v) => Some(v),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef> {
        self.body.iter().filter_map(|item| match item {
            ContractItem::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.body.iter().filter_map(|item| match item {
            ContractItem::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumDef> {
        self.body.iter().filter_map(|item| match item {
            ContractItem::Enum(e) => Some(e),
            _ => None,
        })
    }

    pub fn constructor(&self) -> Option<&FunctionDef> {
        self.functions().find(|f| f.kind == crate::function::FunctionKind::Constructor)
    }

    pub fn fallback(&self) -> Option<&FunctionDef> {
        self.functions().find(|f| f.kind == crate::function::FunctionKind::Fallback)
    }
}
