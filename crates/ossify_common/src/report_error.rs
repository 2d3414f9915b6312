use crate::data::graph_ast::{GraphId, Program};
use ansi_term::Color;
use std::io;

/// Structured errors render themselves against the program (for graph names
/// and call traces) rather than carrying pre-baked message strings.
pub trait Reportable {
    fn report(&self, dest: &mut impl io::Write, program: &Program) -> io::Result<()>;
    fn exit_status(&self) -> i32;
}

/// The chain of in-flight calls at the moment an error was raised, outermost
/// first. Argument shapes are rendered at capture time so the trace stays
/// valid after the engine's caches are gone.
#[derive(Clone, Debug, Default)]
pub struct CallTrace {
    pub frames: Vec<TraceFrame>,
}

#[derive(Clone, Debug)]
pub struct TraceFrame {
    pub graph: GraphId,
    pub argspec: String,
}

impl CallTrace {
    pub fn write(&self, dest: &mut impl io::Write, program: &Program) -> io::Result<()> {
        for frame in &self.frames {
            writeln!(
                dest,
                "  in {} {}",
                program.graph_name(frame.graph),
                frame.argspec
            )?;
        }
        Ok(())
    }
}

pub fn write_titled(dest: &mut impl io::Write, title: &str, body: &str) -> io::Result<()> {
    let title_style = Color::Red.bold();
    writeln!(dest, "{}", title_style.paint(title))?;
    writeln!(dest)?;
    for line in textwrap::fill(body, 80).lines() {
        writeln!(dest, "{}", line)?;
    }
    writeln!(dest)?;
    Ok(())
}
