use crate::{infer, specialize};
use ossify_common::data::graph_ast::Program;
use ossify_common::report_error::Reportable;
use std::io;

#[derive(Debug)]
pub enum Error {
    InferFailed(infer::Error),
    SpecializeFailed(specialize::Error),
}

impl Reportable for Error {
    fn report(&self, dest: &mut impl io::Write, program: &Program) -> io::Result<()> {
        use Error::*;

        match &self {
            InferFailed(err) => err.report(dest, program),
            SpecializeFailed(err) => err.report(dest, program),
        }
    }

    fn exit_status(&self) -> i32 {
        1
    }
}
