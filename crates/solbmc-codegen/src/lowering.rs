//! Recursive expression/statement lowering (spec §4.12, the bulk of stage
//! 11): turns a flat contract's function bodies into emitted text,
//! composing the variable scope resolver (identifier-level rewrite) with
//! the magic-member lowering (`CallState` field access) and the type
//! analyser (declaration types, record names).
//!
//! Grounded on the reference tool's `ExprGenerator`/`FunctionGenerator`
//! discipline of recursing over the AST while threading a single mutable
//! scope, generalized here to return owned `String`s rather than writing
//! straight into an `ostream`, since the emitter (unlike `ostream`) tracks
//! indentation for us.

use indexmap::{IndexMap, IndexSet};
use solbmc_ast::{BinaryOp, ContractDef, Expr, FunctionDef, Literal, Stmt, UnaryOp};
use solbmc_analysis::error::UnsupportedFeature;
use solbmc_analysis::scope::VariableScopeResolver;
use solbmc_analysis::types::{escape_decl_name, unwrap};

use crate::emitter::Emitter;
use crate::magic::parse_magic_type;
use crate::options::Options;
use crate::records::{lower_type_name, mangled_fn_name};

/// The handful of whole-program facts lowering needs beyond the function
/// body itself; threaded alongside the scope resolver rather than folded
/// into it, since (unlike scope) these never change across a function.
pub struct LoweringCtx<'a> {
    pub enum_names: &'a IndexSet<String>,
    /// The contract whose function is currently being lowered; resolves
    /// an internal call's bare name to its declaring function so the
    /// call site can be mangled to match the definition (spec §6).
    pub contract: &'a ContractDef,
    /// Every distinct contract and library reachable in the model, keyed
    /// by name; resolves a library call's base identifier to the
    /// library's own declared functions the same way.
    pub contracts: &'a IndexMap<&'a str, &'a ContractDef>,
}

fn binary_op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
    }
}

/// Lowers a member access whose base is the bare magic identifier
/// `block`/`msg`/`tx` directly to its `CallState` field, bypassing the
/// generic `base->d_<member>` path entirely (spec §3 `CallStateField`).
fn lower_magic_member(base_name: &str, member: &str) -> Option<String> {
    parse_magic_type(base_name, member).map(|field| format!("state->{}", field.field_name()))
}

/// Lowers a single expression to its emitted text.
pub fn lower_expr(
    expr: &Expr,
    scope: &VariableScopeResolver,
    ctx: &LoweringCtx<'_>,
) -> Result<String, UnsupportedFeature> {
    match expr {
        Expr::Ident(name) => scope.resolve(name),
        Expr::Literal(lit) => Ok(match lit {
            Literal::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            Literal::Number(s) => s.clone(),
            Literal::Str(s) => format!("{s:?}"),
            Literal::HexStr(s) => s.clone(),
            Literal::Address(value) => solbmc_analysis::address_space::literal_name(value),
        }),
        Expr::Binary { op, lhs, rhs } => {
            let l = lower_expr(lhs, scope, ctx)?;
            let r = lower_expr(rhs, scope, ctx)?;
            Ok(format!("({l} {} {r})", binary_op_text(*op)))
        }
        Expr::Unary { op, expr: inner } => {
            let e = lower_expr(inner, scope, ctx)?;
            Ok(match op {
                UnaryOp::Neg => format!("(-{e})"),
                UnaryOp::Not => format!("(!{e})"),
                UnaryOp::BitNot => format!("(~{e})"),
                UnaryOp::PreInc => format!("(++{e})"),
                UnaryOp::PreDec => format!("(--{e})"),
                UnaryOp::PostInc => format!("({e}++)"),
                UnaryOp::PostDec => format!("({e}--)"),
            })
        }
        Expr::Ternary { cond, then_branch, else_branch } => {
            let c = lower_expr(cond, scope, ctx)?;
            let t = lower_expr(then_branch, scope, ctx)?;
            let f = lower_expr(else_branch, scope, ctx)?;
            Ok(format!("({c} ? {t} : {f})"))
        }
        Expr::Assign { lhs, op, rhs } => {
            if let Expr::Index { base, index } = lhs.as_ref() {
                if op.is_some() {
                    return Err(UnsupportedFeature::Other(
                        "compound assignment through a mapping/array index is not supported".into(),
                    ));
                }
                let b = lower_expr(base, scope, ctx)?;
                let i = lower_expr(index, scope, ctx)?;
                let r = lower_expr(rhs, scope, ctx)?;
                return Ok(format!("sol_map_set({b}, {i}, {r})"));
            }
            let l = lower_expr(lhs, scope, ctx)?;
            let r = lower_expr(rhs, scope, ctx)?;
            Ok(match op {
                Some(o) => format!("{l} {}= {r}", binary_op_text(*o)),
                None => format!("{l} = {r}"),
            })
        }
        Expr::Call { callee, args } => lower_call(callee, args, scope, ctx),
        Expr::New { ty, args } => {
            let Some(name) = (match unwrap(ty) {
                solbmc_ast::Type::Custom(n) => Some(n),
                _ => None,
            }) else {
                return Err(UnsupportedFeature::Other("`new` of a non-contract type".into()));
            };
            let mut call_args = vec!["state".to_string()];
            for a in args {
                call_args.push(lower_expr(a, scope, ctx)?);
            }
            Ok(format!("new_{}({})", escape_decl_name(&name), call_args.join(", ")))
        }
        Expr::Member { base, member } => {
            if let Expr::Ident(base_name) = base.as_ref() {
                if let Some(text) = lower_magic_member(base_name, member) {
                    return Ok(text);
                }
            }
            let base_text = lower_expr(base, scope, ctx)?;
            Ok(format!("{base_text}->d_{}", escape_decl_name(member)))
        }
        Expr::Index { base, index } => {
            let b = lower_expr(base, scope, ctx)?;
            let i = lower_expr(index, scope, ctx)?;
            Ok(format!("sol_map_get({b}, {i})"))
        }
        Expr::Tuple(_) => {
            Err(UnsupportedFeature::Other("tuple expressions are not supported".into()))
        }
    }
}

fn lower_call(
    callee: &Expr,
    args: &[Expr],
    scope: &VariableScopeResolver,
    ctx: &LoweringCtx<'_>,
) -> Result<String, UnsupportedFeature> {
    let arg_texts: Vec<String> =
        args.iter().map(|a| lower_expr(a, scope, ctx)).collect::<Result<_, _>>()?;

    match callee {
        Expr::Ident(name) if name == "require" => Ok(format!("sol_require({})", arg_texts.join(", "))),
        Expr::Ident(name) if name == "assert" => Ok(format!("sol_assert({})", arg_texts.join(", "))),
        // Internal call within the same flat interface: every lowered
        // function takes (self, state, ...params) as a fixed calling
        // convention (spec §6 "Emitted state layout"). Resolved by name
        // and arity against the owner contract's full declared function
        // list, the same precision the call graph uses, so the emitted
        // call targets the exact mangled symbol that definition gets.
        Expr::Ident(name) => {
            let mangled = ctx
                .contract
                .functions()
                .find(|g| g.dispatch_name() == name && g.params.len() == args.len())
                .map(|target| mangled_fn_name(&ctx.contract.name, target, ctx.enum_names))
                .unwrap_or_else(|| escape_decl_name(name));
            let mut call_args = vec!["self".to_string(), "state".to_string()];
            call_args.extend(arg_texts);
            Ok(format!("{}({})", mangled, call_args.join(", ")))
        }
        // A library call (`Lib.f(...)`) or a call through a resolved
        // contract-typed expression (`other.f(...)`): the base lowers to
        // the callee's own `self` pointer. A library call's base is
        // always the bare library identifier, which already names the
        // contract whose functions define `member`; a call through a
        // contract-typed variable can't be resolved to its static type
        // here (lowering has no access to the expression analyser's
        // type map) and falls back to the bare escaped name.
        Expr::Member { base, member } => {
            let base_text = lower_expr(base, scope, ctx)?;
            let mut call_args = vec![base_text, "state".to_string()];
            call_args.extend(arg_texts);
            let mangled = match base.as_ref() {
                Expr::Ident(base_name) => ctx
                    .contracts
                    .get(base_name.as_str())
                    .and_then(|c| c.functions().find(|g| g.dispatch_name() == member && g.params.len() == args.len()))
                    .map(|target| mangled_fn_name(base_name, target, ctx.enum_names))
                    .unwrap_or_else(|| escape_decl_name(member)),
                _ => escape_decl_name(member),
            };
            Ok(format!("{}({})", mangled, call_args.join(", ")))
        }
        other => {
            let callee_text = lower_expr(other, scope, ctx)?;
            Ok(format!("{callee_text}({})", arg_texts.join(", ")))
        }
    }
}

/// Lowers a single statement, writing directly into `e` (statements, unlike
/// expressions, have no useful "value" to bubble up).
pub fn lower_stmt(
    stmt: &Stmt,
    e: &mut Emitter,
    scope: &mut VariableScopeResolver,
    ctx: &LoweringCtx<'_>,
) -> Result<(), UnsupportedFeature> {
    match stmt {
        Stmt::Block(stmts) => {
            e.line("{");
            scope.enter();
            let result = e.indented(|e| -> Result<(), UnsupportedFeature> {
                for s in stmts {
                    lower_stmt(s, e, scope, ctx)?;
                }
                Ok(())
            });
            scope.exit();
            result?;
            e.line("}");
            Ok(())
        }
        Stmt::If { cond, then_branch, else_branch } => {
            let c = lower_expr(cond, scope, ctx)?;
            e.line(format!("if ({c})"));
            lower_stmt(then_branch, e, scope, ctx)?;
            if let Some(eb) = else_branch {
                e.line("else");
                lower_stmt(eb, e, scope, ctx)?;
            }
            Ok(())
        }
        Stmt::While { cond, body } => {
            let c = lower_expr(cond, scope, ctx)?;
            e.line(format!("while ({c})"));
            lower_stmt(body, e, scope, ctx)
        }
        Stmt::For { init, cond, update, body } => {
            e.line("{");
            scope.enter();
            let result = e.indented(|e| -> Result<(), UnsupportedFeature> {
                if let Some(init) = init {
                    lower_stmt(init, e, scope, ctx)?;
                }
                let cond_text = match cond {
                    Some(c) => lower_expr(c, scope, ctx)?,
                    None => "1".to_string(),
                };
                e.line(format!("while ({cond_text})"));
                e.line("{");
                let inner = e.indented(|e| -> Result<(), UnsupportedFeature> {
                    lower_stmt(body, e, scope, ctx)?;
                    if let Some(update) = update {
                        let u = lower_expr(update, scope, ctx)?;
                        e.line(format!("{u};"));
                    }
                    Ok(())
                });
                e.line("}");
                inner
            });
            scope.exit();
            result?;
            e.line("}");
            Ok(())
        }
        Stmt::Return(expr) => {
            match expr {
                Some(expr) => {
                    let v = lower_expr(expr, scope, ctx)?;
                    e.line(format!("return {v};"));
                }
                None => e.line("return;"),
            }
            Ok(())
        }
        Stmt::Break => {
            e.line("break;");
            Ok(())
        }
        Stmt::Continue => {
            e.line("continue;");
            Ok(())
        }
        Stmt::Emit { .. } => Err(UnsupportedFeature::Statement("emit")),
        Stmt::Assembly(_) => Err(UnsupportedFeature::InlineAssembly),
        Stmt::VarDecl { decls, init } => {
            if decls.len() != 1 {
                return Err(UnsupportedFeature::Other(
                    "multi-variable declarations are not supported".into(),
                ));
            }
            let decl = &decls[0];
            let ty_name = lower_type_name(&decl.ty, ctx.enum_names);
            let text = match init {
                Some(init_expr) => {
                    let v = lower_expr(init_expr, scope, ctx)?;
                    format!("{ty_name} {} = {v};", decl.name)
                }
                None => format!("{ty_name} {};", decl.name),
            };
            scope.record(decl.name.clone());
            e.line(text);
            Ok(())
        }
        Stmt::Expr(expr) => {
            let v = lower_expr(expr, scope, ctx)?;
            e.line(format!("{v};"));
            Ok(())
        }
    }
}

/// Lowers one function to its full declaration: prototype only when
/// `opts.forward_declare` or the function has no body (an interface
/// declaration), the full body otherwise.
///
/// Every lowered function shares one calling convention regardless of its
/// Solidity visibility: `(struct <contract_record> *self, struct CallState
/// *state, ...declared params)` (spec §6).
pub fn lower_function(
    f: &FunctionDef,
    e: &mut Emitter,
    ctx: &LoweringCtx<'_>,
    opts: &Options,
) -> Result<(), UnsupportedFeature> {
    if f.returns.len() > 1 {
        return Err(UnsupportedFeature::MultipleReturns(f.dispatch_name().to_string()));
    }
    let ret_ty = match f.returns.first() {
        Some(p) => lower_type_name(&p.ty, ctx.enum_names),
        None => "void".to_string(),
    };

    let mut scope = VariableScopeResolver::new();
    let contract_record = format!("struct_{}", escape_decl_name(&ctx.contract.name));
    let mut params = vec![format!("struct {contract_record} *self"), "struct CallState *state".to_string()];
    for p in &f.params {
        let name = p.name.clone().unwrap_or_else(|| "_".to_string());
        scope.record(name.clone());
        params.push(format!("{} {name}", lower_type_name(&p.ty, ctx.enum_names)));
    }

    let name = mangled_fn_name(&ctx.contract.name, f, ctx.enum_names);
    let signature = format!("{ret_ty} {name}({})", params.join(", "));

    if opts.forward_declare || f.body.is_none() {
        e.line(format!("{signature};"));
        return Ok(());
    }

    e.line(signature);
    let body = f.body.as_ref().expect("checked above");
    lower_stmt(body, e, &mut scope, ctx)
}
