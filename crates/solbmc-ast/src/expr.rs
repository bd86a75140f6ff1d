use serde::{Deserialize, Serialize};

use crate::{ident::Ident, ty::Type};

/// A binary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// True for the ordering comparisons (not equality), relevant to the
    /// map-index summary's "compare" violation kind.
    pub fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }
}

/// A unary operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

/// A literal value. Numeric literals keep their source text: the frontend
/// is responsible for width/sign resolution, not this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    /// Decimal or hex integer/rational literal, verbatim.
    Number(String),
    Str(String),
    HexStr(String),
    Address(String),
}

/// An expression node.
///
/// Solidity reference vocabulary per spec §6: identifier, literal,
/// binary/unary/conditional, call, member access, index access, tuple, new.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    Literal(Literal),
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnaryOp, expr: Box<Expr> },
    /// `cond ? t : f`.
    Ternary { cond: Box<Expr>, then_branch: Box<Expr>, else_branch: Box<Expr> },
    Assign { lhs: Box<Expr>, op: Option<BinaryOp>, rhs: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `new T(...)`; `args` become the constructor call's arguments.
    New { ty: Type, args: Vec<Expr> },
    Member { base: Box<Expr>, member: Ident },
    Index { base: Box<Expr>, index: Box<Expr> },
    Tuple(Vec<Expr>),
}

impl Expr {
    /// Walks to the leftmost identifier of a member-access chain, e.g.
    /// `a.b.c` yields `a`. Used by the scope resolver / magic-type lookup
    /// to find the base of a chained member access.
    pub fn base_ident(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            Expr::Member { base, .. } => base.base_ident(),
            _ => None,
        }
    }
}
