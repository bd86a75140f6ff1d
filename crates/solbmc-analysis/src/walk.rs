//! A small shared AST walk, used by every pass that needs to visit every
//! expression (or every call, or every string literal) reachable from a
//! function body or state-variable initialiser: [`crate::strings`],
//! [`crate::map_index`], and [`crate::call_graph`] all fold over the same
//! shape rather than each re-implementing statement recursion.

use solbmc_ast::{Expr, Stmt};

/// Invokes `f` on `expr` and then recursively on every sub-expression, in
/// the order they would be encountered by a left-to-right AST traversal.
pub fn visit_expr<'e>(expr: &'e Expr, f: &mut impl FnMut(&'e Expr)) {
    f(expr);
    match expr {
        Expr::Ident(_) | Expr::Literal(_) => {}
        Expr::Binary { lhs, rhs, .. } => {
            visit_expr(lhs, f);
            visit_expr(rhs, f);
        }
        Expr::Unary { expr, .. } => visit_expr(expr, f),
        Expr::Ternary { cond, then_branch, else_branch } => {
            visit_expr(cond, f);
            visit_expr(then_branch, f);
            visit_expr(else_branch, f);
        }
        Expr::Assign { lhs, rhs, .. } => {
            visit_expr(lhs, f);
            visit_expr(rhs, f);
        }
        Expr::Call { callee, args } => {
            visit_expr(callee, f);
            for arg in args {
                visit_expr(arg, f);
            }
        }
        Expr::New { args, .. } => {
            for arg in args {
                visit_expr(arg, f);
            }
        }
        Expr::Member { base, .. } => visit_expr(base, f),
        Expr::Index { base, index } => {
            visit_expr(base, f);
            visit_expr(index, f);
        }
        Expr::Tuple(items) => {
            for item in items {
                visit_expr(item, f);
            }
        }
    }
}

/// Invokes `f` on every expression reachable from `stmt`, recursing into
/// nested statements in source order.
pub fn visit_stmt_exprs<'e>(stmt: &'e Stmt, f: &mut impl FnMut(&'e Expr)) {
    match stmt {
        Stmt::Block(stmts) => {
            for s in stmts {
                visit_stmt_exprs(s, f);
            }
        }
        Stmt::If { cond, then_branch, else_branch } => {
            visit_expr(cond, f);
            visit_stmt_exprs(then_branch, f);
            if let Some(else_branch) = else_branch {
                visit_stmt_exprs(else_branch, f);
            }
        }
        Stmt::While { cond, body } => {
            visit_expr(cond, f);
            visit_stmt_exprs(body, f);
        }
        Stmt::For { init, cond, update, body } => {
            if let Some(init) = init {
                visit_stmt_exprs(init, f);
            }
            if let Some(cond) = cond {
                visit_expr(cond, f);
            }
            if let Some(update) = update {
                visit_expr(update, f);
            }
            visit_stmt_exprs(body, f);
        }
        Stmt::Return(expr) => {
            if let Some(expr) = expr {
                visit_expr(expr, f);
            }
        }
        Stmt::Break | Stmt::Continue | Stmt::Assembly(_) => {}
        Stmt::Emit { args, .. } => {
            for arg in args {
                visit_expr(arg, f);
            }
        }
        Stmt::VarDecl { init, .. } => {
            if let Some(init) = init {
                visit_expr(init, f);
            }
        }
        Stmt::Expr(expr) => visit_expr(expr, f),
    }
}
