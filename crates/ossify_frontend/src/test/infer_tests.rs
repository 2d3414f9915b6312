use crate::infer::{self, ErrorKind};
use crate::infer_entry;
use crate::test::build_if;
use ossify_common::config::PassConfig;
use ossify_common::data::abstract_ast::AbstractValue;
use ossify_common::data::graph_ast::{Program, ProgramBuilder, Value};
use ossify_common::data::intrinsics::Intrinsic;
use ossify_common::progress::ProgressMode;
use ossify_common::report_error::Reportable;

fn infer<'a>(
    program: &'a Program,
    args: &'a [Value],
) -> Result<infer::InferredProgram<'a>, crate::error::Error> {
    infer_entry(program, args, &PassConfig::default(), ProgressMode::Hidden)
}

fn unwrap_infer_error(result: crate::error::Error) -> infer::Error {
    match result {
        crate::error::Error::InferFailed(err) => err,
        other => panic!("expected an inference error, got {:?}", other),
    }
}

fn mul_program() -> Program {
    let mut b = ProgramBuilder::new();
    let main = b.new_graph("main", None);
    let x = b.param(main);
    let y = b.param(main);
    let ret = b.prim_app(main, Intrinsic::Mul, vec![x, y]);
    b.set_ret(main, ret);
    b.finish(main)
}

#[test]
fn scalar_result_follows_argument_kinds() {
    let program = mul_program();

    let inferred = infer(&program, &[Value::Int(13), Value::Int(21)]).unwrap();
    assert_eq!(inferred.entry_result, AbstractValue::Int);

    let inferred = infer(&program, &[Value::Float(2.7), Value::Int(13)]).unwrap();
    assert_eq!(inferred.entry_result, AbstractValue::Float);
}

#[test]
fn inference_is_deterministic() {
    let program = mul_program();
    let args = [Value::Int(13), Value::Int(21)];

    let first = infer(&program, &args).unwrap();
    let second = infer(&program, &args).unwrap();
    assert_eq!(first.entry_result, second.entry_result);
    assert_eq!(first.num_frames(), second.num_frames());
}

#[test]
fn branch_kind_disagreement_is_a_type_mismatch() {
    // main(c, x) = if c then x else 2.7, with x an integer: the two branch
    // thunks produce different scalar kinds at the join.
    let mut b = ProgramBuilder::new();
    let main = b.new_graph("main", None);
    let c = b.param(main);
    let x = b.param(main);
    let then_g = b.new_graph("then", Some(main));
    let then_ret = x;
    b.set_ret(then_g, then_ret);
    let else_g = b.new_graph("else", Some(main));
    let else_ret = b.float(2.7);
    b.set_ret(else_g, else_ret);
    let ret = build_if(&mut b, main, c, then_g, else_g);
    b.set_ret(main, ret);
    let program = b.finish(main);

    let err = unwrap_infer_error(
        infer(&program, &[Value::Bool(true), Value::Int(13)]).unwrap_err(),
    );
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    assert!(!err.trace.frames.is_empty());

    let mut rendered = Vec::new();
    err.report(&mut rendered, &program).unwrap();
    assert!(!rendered.is_empty());
}

#[test]
fn boolean_operand_to_arithmetic_is_undefined() {
    let program = mul_program();
    let err = unwrap_infer_error(
        infer(&program, &[Value::Int(13), Value::Bool(true)]).unwrap_err(),
    );
    assert!(matches!(err.kind, ErrorKind::UndefinedOperation { .. }));
}

#[test]
fn self_call_with_no_exit_never_resolves() {
    let mut b = ProgramBuilder::new();
    let main = b.new_graph("main", None);
    let x = b.param(main);
    let self_ref = b.graph_ref(main);
    let ret = b.app(main, self_ref, vec![x]);
    b.set_ret(main, ret);
    let program = b.finish(main);

    let err = unwrap_infer_error(infer(&program, &[Value::Int(13)]).unwrap_err());
    assert!(matches!(err.kind, ErrorKind::NonTerminatingInference { .. }));
}

#[test]
fn shape_growing_recursion_hits_the_context_bound() {
    // main(x) = main((x,)): every recursive call invents a deeper tuple
    // shape, so no fixpoint bound can help; the context population bound
    // converts this into an error.
    let mut b = ProgramBuilder::new();
    let main = b.new_graph("main", None);
    let x = b.param(main);
    let wrapped = b.prim_app(main, Intrinsic::TupleNew, vec![x]);
    let self_ref = b.graph_ref(main);
    let ret = b.app(main, self_ref, vec![wrapped]);
    b.set_ret(main, ret);
    let program = b.finish(main);

    let config = PassConfig {
        fixpoint_iter_limit: 16,
        context_limit: 64,
    };
    let err = match infer_entry(&program, &[Value::Int(13)], &config, ProgressMode::Hidden) {
        Err(crate::error::Error::InferFailed(err)) => err,
        other => panic!("expected an inference error, got {:?}", other),
    };
    assert!(matches!(err.kind, ErrorKind::NonTerminatingInference { .. }));
}

#[test]
fn entry_arity_is_checked() {
    let program = mul_program();
    let err = unwrap_infer_error(infer(&program, &[Value::Int(13)]).unwrap_err());
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}
