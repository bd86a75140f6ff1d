use serde::{Deserialize, Serialize};

use crate::{expr::Expr, ident::Ident, ty::Type};

/// A single declared variable within a variable-declaration statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Ident,
    pub ty: Type,
}

/// A statement node.
///
/// Solidity reference vocabulary per spec §6: block, if, while, for,
/// return, break, continue, emit, variable-declaration, expression-statement.
/// `Assembly` is included only so the frontend has somewhere to put inline
/// assembly blocks; the translator always rejects it (spec §7).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Block(Vec<Stmt>),
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Emit { event: Ident, args: Vec<Expr> },
    VarDecl { decls: Vec<VarDecl>, init: Option<Expr> },
    Expr(Expr),
    /// Opaque inline-assembly payload; never lowered, always rejected.
    Assembly(String),
}
