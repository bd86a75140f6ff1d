use serde::{Deserialize, Serialize};

use crate::{expr::Expr, ident::Ident, stmt::Stmt, ty::Type};

/// Distinguishes the five shapes the grammar allows under a single
/// function-like production (spec §6's "function, modifier, fallback,
/// constructor").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Constructor,
    Fallback,
    Receive,
    Modifier,
}

/// Visibility as declared on the function. Only `Public`/`External` are
/// ever placed into a flat contract's dispatch table (§4.3); the rest are
/// only reachable via internal calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

/// A single named, typed parameter (also used for return values).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Option<Ident>,
    pub ty: Type,
}

/// A modifier invocation on a function (`foo() onlyOwner { ... }`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifierInvocation {
    pub name: Ident,
    pub args: Vec<Expr>,
}

/// A function, constructor, fallback, receive, or modifier definition.
///
/// `super_function` mirrors the frontend's `superFunction` annotation
/// (spec §6): when this definition overrides a base implementation, it
/// points at the next function up the linearized base chain, and the call
/// graph builder walks this chain to resolve `super.f()` calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub kind: FunctionKind,
    /// `None` for constructors, fallback, and receive.
    pub name: Option<Ident>,
    pub visibility: Visibility,
    pub params: Vec<Param>,
    pub returns: Vec<Param>,
    pub modifiers: Vec<ModifierInvocation>,
    /// `None` for unimplemented (abstract / interface) declarations.
    pub body: Option<Stmt>,
    pub super_function: Option<Box<FunctionDef>>,
}

impl FunctionDef {
    /// The name used to key the flat interface and the call graph. Falls
    /// back to the kind's fixed name for constructor/fallback/receive.
    pub fn dispatch_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => match self.kind {
                FunctionKind::Constructor => "constructor",
                FunctionKind::Fallback => "fallback",
                FunctionKind::Receive => "receive",
                FunctionKind::Function | FunctionKind::Modifier => "",
            },
        }
    }

    /// True if this entry would be part of a contract's public interface.
    pub fn is_public_entry(&self) -> bool {
        matches!(self.visibility, Visibility::Public | Visibility::External)
            && self.body.is_some()
            && matches!(self.kind, FunctionKind::Function)
    }
}
