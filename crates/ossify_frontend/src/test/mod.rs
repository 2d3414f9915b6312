mod infer_tests;

use crate::error::Error;
use crate::specialize_entry;
use ossify_common::config::PassConfig;
use ossify_common::data::graph_ast::{GraphId, NodeId, Program, ProgramBuilder, Value};
use ossify_common::data::intrinsics::Intrinsic;
use ossify_common::data::mono_ast;
use ossify_common::progress::ProgressMode;

fn compile(program: &Program, args: &[Value]) -> Result<mono_ast::Program, Error> {
    specialize_entry(program, args, &PassConfig::default(), ProgressMode::Hidden)
}

fn run(program: &Program, args: &[Value]) -> Value {
    let mono = compile(program, args).unwrap_or_else(|err| panic!("pipeline failed: {:?}", err));
    crate::evaluate_mono(&mono, args)
        .to_concrete()
        .expect("entry returned a non-data value")
}

fn instances_named(mono: &mono_ast::Program, name: &str) -> usize {
    mono.graphs
        .iter()
        .filter(|(_, def)| def.name.as_deref() == Some(name))
        .count()
}

/// Conditionals in the thunk encoding the parser produces: each branch is a
/// zero-parameter graph and the selected one is called.
fn build_if(
    b: &mut ProgramBuilder,
    owner: GraphId,
    cond: NodeId,
    then_graph: GraphId,
    else_graph: GraphId,
) -> NodeId {
    let on_true = b.graph_ref(then_graph);
    let on_false = b.graph_ref(else_graph);
    let selected = b.prim_app(owner, Intrinsic::Switch, vec![cond, on_true, on_false]);
    b.app(owner, selected, vec![])
}
