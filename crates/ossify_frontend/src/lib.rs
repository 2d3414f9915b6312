#[cfg(test)]
mod test;

pub mod error;
pub mod infer;
pub mod interp;
pub mod specialize;

use ossify_common::config::PassConfig;
use ossify_common::data::abstract_ast::AbstractValue;
use ossify_common::data::graph_ast::{Program, Value};
use ossify_common::data::mono_ast;
use ossify_common::progress::{self, ProgressMode};
use ossify_common::report_error::CallTrace;

use crate::error::Error;

/// Lifts the entry call's concrete arguments and infers abstract values for
/// everything reachable from it.
pub fn infer_entry<'a>(
    program: &'a Program,
    entry_args: &[Value],
    config: &PassConfig,
    progress_mode: ProgressMode,
) -> Result<infer::InferredProgram<'a>, Error> {
    let argspec = entry_args
        .iter()
        .map(ossify_common::data::abstract_ast::broaden_value)
        .collect::<Result<Vec<AbstractValue>, _>>()
        .map_err(|mismatch| {
            Error::InferFailed(infer::Error {
                kind: infer::ErrorKind::TypeMismatch {
                    left: mismatch.left.to_string(),
                    right: mismatch.right.to_string(),
                },
                node: None,
                trace: CallTrace::default(),
            })
        })?;

    infer::infer_program(
        program,
        argspec,
        config,
        progress::bar(progress_mode, "infer"),
    )
    .map_err(Error::InferFailed)
}

/// The whole pipeline: broaden the entry arguments, infer, then emit the
/// monomorphic program the downstream passes consume.
pub fn specialize_entry(
    program: &Program,
    entry_args: &[Value],
    config: &PassConfig,
    progress_mode: ProgressMode,
) -> Result<mono_ast::Program, Error> {
    let inferred = infer_entry(program, entry_args, config, progress_mode)?;

    specialize::specialize_program(&inferred, progress::bar(progress_mode, "specialize"))
        .map_err(Error::SpecializeFailed)
}

/// Debug evaluation of specialized output against concrete inputs.
pub fn evaluate_mono(program: &mono_ast::Program, args: &[Value]) -> interp::Value {
    interp::evaluate(program, args)
}
