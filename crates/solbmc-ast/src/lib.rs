//! Plain-data AST types for the solbmc model-checking translator.
//!
//! These types describe the frontend's output document, not a parser's
//! output: there are no spans and no [`syn`](https://docs.rs/syn)-style
//! `Parse` impls, because parsing source text is explicitly out of scope
//! (the frontend that produces this tree is a separate, external
//! component). A document is loaded with [`serde_json`] and the analysis
//! crate takes it from there.

pub mod contract;
pub mod expr;
pub mod function;
pub mod ident;
pub mod stmt;
pub mod ty;
pub mod unit;

pub use contract::{ContractDef, ContractItem, ContractKind, EnumDef, StateVarDef, StructDef};
pub use expr::{BinaryOp, Expr, Literal, UnaryOp};
pub use function::{FunctionDef, FunctionKind, ModifierInvocation, Param, Visibility};
pub use ident::Ident;
pub use stmt::{Stmt, VarDecl};
pub use ty::{MagicKind, Type};
pub use unit::SourceUnit;
