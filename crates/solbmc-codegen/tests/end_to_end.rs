//! End-to-end pipeline tests: build a small AST by hand, run it through
//! [`solbmc_analysis::stack::AnalysisStack`] and [`solbmc_codegen::generate`],
//! and check the emitted model's shape. Mirrors the structural-assertion
//! style of `sol-macro-expander`'s `tests/codegen.rs` (pin public surface
//! and generated-text shape, not a byte-for-byte golden file).

use solbmc_analysis::stack::AnalysisStack;
use solbmc_ast::{
    BinaryOp, ContractDef, ContractItem, ContractKind, Expr, FunctionDef, FunctionKind, Literal,
    Param, SourceUnit, StateVarDef, Stmt, Type, VarDecl, Visibility,
};
use solbmc_codegen::Options;

fn public_fn(name: &str, params: Vec<Param>, body: Stmt) -> FunctionDef {
    FunctionDef {
        kind: FunctionKind::Function,
        name: Some(name.to_string()),
        visibility: Visibility::Public,
        params,
        returns: vec![],
        modifiers: vec![],
        body: Some(body),
        super_function: None,
    }
}

fn param(name: &str, ty: Type) -> Param {
    Param { name: Some(name.to_string()), ty }
}

/// A `Wallet` contract: one `uint256` balance field, a `deposit(uint256)`
/// entry point that adds to it via `msg.value`-flavoured arithmetic, and a
/// `greeting` string literal pulled through the string lookup.
fn wallet_contract() -> ContractDef {
    let deposit_body = Stmt::Block(vec![
        Stmt::VarDecl {
            decls: vec![VarDecl { name: "note".into(), ty: Type::String }],
            init: Some(Expr::Literal(Literal::Str("deposited".into()))),
        },
        Stmt::Expr(Expr::Assign {
            lhs: Box::new(Expr::Ident("balance".into())),
            op: Some(BinaryOp::Add),
            rhs: Box::new(Expr::Ident("amount".into())),
        }),
    ]);

    ContractDef {
        name: "Wallet".into(),
        kind: ContractKind::Contract,
        bases: vec![],
        body: vec![
            ContractItem::StateVar(StateVarDef {
                name: "balance".into(),
                ty: Type::Uint(Some(256)),
                initializer: None,
            }),
            ContractItem::Function(public_fn(
                "deposit",
                vec![param("amount", Type::Uint(Some(256)))],
                deposit_body,
            )),
        ],
    }
}

#[test]
fn full_pipeline_emits_a_model_for_a_single_contract() {
    let unit = SourceUnit { contracts: vec![wallet_contract()] };
    let units = [unit];
    let stack = AnalysisStack::build(&units, &["Wallet".to_string()]).expect("analysis stack");
    assert!(stack.bundle.missing().is_empty());
    assert_eq!(stack.tight_bundle.size(), 1);

    let model = solbmc_codegen::generate(&stack, &Options::default()).expect("codegen");

    assert!(model.contains("struct_Wallet"), "missing storage record:\n{model}");
    assert!(model.contains("d_balance"), "missing lowered state var:\n{model}");
    assert!(model.contains("deposit("), "missing lowered function:\n{model}");
    assert!(model.contains("self->d_balance"), "missing self-rewrite:\n{model}");
    assert!(model.contains("int main(void)"), "missing driver main:\n{model}");
    assert!(model.contains("g_instance_1"), "missing tight-bundle instance decl:\n{model}");
}

#[test]
fn forward_declare_option_omits_function_bodies() {
    let unit = SourceUnit { contracts: vec![wallet_contract()] };
    let units = [unit];
    let stack = AnalysisStack::build(&units, &["Wallet".to_string()]).expect("analysis stack");

    let opts = Options { forward_declare: true, ..Options::default() };
    let model = solbmc_codegen::generate(&stack, &opts).expect("codegen");

    assert!(model.contains("deposit("), "missing forward declaration:\n{model}");
    assert!(!model.contains("self->d_balance"), "body leaked under --forward-declare:\n{model}");
}

#[test]
fn missing_bundle_name_does_not_abort_the_whole_stack() {
    let unit = SourceUnit { contracts: vec![wallet_contract()] };
    let units = [unit];
    let stack = AnalysisStack::build(&units, &["Wallet".to_string(), "Ghost".to_string()])
        .expect("analysis stack");

    assert_eq!(stack.bundle.missing(), &["Ghost".to_string()]);
    assert_eq!(stack.bundle.contracts().len(), 1);
}

#[test]
fn bare_super_is_rejected_as_an_unsupported_feature() {
    let body = Stmt::Return(Some(Expr::Ident("super".into())));
    let contract = ContractDef {
        name: "Bad".into(),
        kind: ContractKind::Contract,
        bases: vec![],
        body: vec![ContractItem::Function(public_fn("f", vec![], body))],
    };
    let unit = SourceUnit { contracts: vec![contract] };
    let units = [unit];
    let stack = AnalysisStack::build(&units, &["Bad".to_string()]).expect("analysis stack");

    let err = solbmc_codegen::generate(&stack, &Options::default()).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
