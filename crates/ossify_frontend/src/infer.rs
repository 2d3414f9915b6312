use ossify_common::config::PassConfig;
use ossify_common::data::abstract_ast::{
    broaden_abstract, contains_bottom, display_argspec, join, matches_kind, AbstractValue,
    CallContext, Context, FuncCase, FuncRep,
};
use ossify_common::data::graph_ast::{Const, GraphId, Node, NodeId, Program};
use ossify_common::data::intrinsics::Intrinsic;
use ossify_common::intrinsic_config::{intrinsic_to_name, scalar_sig, ScalarSig};
use ossify_common::report_error::{write_titled, CallTrace, Reportable, TraceFrame};
use ossify_common::util::intern::Interner;
use ossify_common::util::progress_logger::{ProgressLogger, ProgressSession};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum ErrorKind {
    #[error("incompatible shapes: {left} vs {right}")]
    TypeMismatch { left: String, right: String },
    #[error("'{prim}' is not defined for operands {operands}")]
    UndefinedOperation { prim: &'static str, operands: String },
    #[error("abstract interpretation did not converge: {detail}")]
    NonTerminatingInference { detail: String },
    #[error("no callable reaches this call's function position")]
    AmbiguousCall,
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    /// The node being inferred when the error was raised, if any.
    pub node: Option<NodeId>,
    pub trace: CallTrace,
}

impl Reportable for Error {
    fn report(&self, dest: &mut impl io::Write, program: &Program) -> io::Result<()> {
        let title = match &self.kind {
            ErrorKind::TypeMismatch { .. } => "Type Mismatch",
            ErrorKind::UndefinedOperation { .. } => "Undefined Operation",
            ErrorKind::NonTerminatingInference { .. } => "Non-Terminating Inference",
            ErrorKind::AmbiguousCall => "Ambiguous Call",
        };
        write_titled(dest, title, &self.kind.to_string())?;
        self.trace.write(dest, program)
    }

    fn exit_status(&self) -> i32 {
        1
    }
}

/// Everything inference learned, handed to the specializer: per-call-frame
/// results, per-(frame, node) abstract values, and the call shapes observed
/// through each function reference.
#[derive(Debug)]
pub struct InferredProgram<'a> {
    pub program: &'a Program,
    pub entry_ctx: Context,
    pub entry_result: AbstractValue,
    calls: BTreeMap<Context, FrameResult>,
    call_shapes: BTreeMap<ShapeKey, BTreeSet<Vec<AbstractValue>>>,
    interner: Interner<CallContext>,
}

/// A function reference's identity for call-shape bookkeeping: the graph, the
/// frame chain its captures resolve against, and the constant node it came
/// from (so distinct mentions keep distinct books).
type ShapeKey = (GraphId, Option<Context>, NodeId);

#[derive(Clone, Debug)]
struct FrameResult {
    result: AbstractValue,
    nodes: BTreeMap<NodeId, AbstractValue>,
}

impl<'a> InferredProgram<'a> {
    pub fn result_of(&self, ctx: &Context) -> Option<&AbstractValue> {
        self.calls.get(ctx).map(|frame| &frame.result)
    }

    pub fn node_value(&self, ctx: &Context, node: NodeId) -> Option<&AbstractValue> {
        self.calls.get(ctx).and_then(|frame| frame.nodes.get(&node))
    }

    pub fn call_shapes_of(
        &self,
        graph: GraphId,
        scope: &Option<Context>,
        origin: NodeId,
    ) -> impl Iterator<Item = &Vec<AbstractValue>> {
        self.call_shapes
            .get(&(graph, scope.clone(), origin))
            .into_iter()
            .flatten()
    }

    /// Reconstructs a context observed during inference. Interning is
    /// idempotent, so this cannot invent a frame that was never inferred
    /// without `result_of` returning `None` for it afterwards.
    pub fn context(
        &self,
        parent: Option<Context>,
        graph: GraphId,
        argspec: Vec<AbstractValue>,
    ) -> Context {
        self.interner.intern(CallContext {
            parent,
            graph,
            argspec,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.calls.len()
    }
}

/// Infers the abstract value of every node reachable from `entry` invoked at
/// `argspec` (already broadened), without executing anything.
pub fn infer_program<'a>(
    program: &'a Program,
    argspec: Vec<AbstractValue>,
    config: &PassConfig,
    progress: impl ProgressLogger,
) -> Result<InferredProgram<'a>, Error> {
    let mut engine = Engine {
        program,
        config: *config,
        interner: Interner::new(),
        calls: BTreeMap::new(),
        call_shapes: BTreeMap::new(),
        active: Vec::new(),
        lowest_read: usize::MAX,
        pass_counter: 0,
        progress: progress.start_session(None),
    };

    let expected = program.graphs[program.entry].params.len();
    if argspec.len() != expected {
        return Err(engine.error(
            ErrorKind::TypeMismatch {
                left: format!("{} arguments", argspec.len()),
                right: format!("{} parameters", expected),
            },
            None,
        ));
    }

    let entry_ctx = engine.intern_context(None, program.entry, argspec)?;
    let entry_result = engine.infer_call(&entry_ctx)?;

    if contains_bottom(&entry_result) {
        return Err(engine.error(
            ErrorKind::NonTerminatingInference {
                detail: "the entry result never resolves to a value".to_owned(),
            },
            None,
        ));
    }

    // Frames belonging to call cycles may still be provisional even though
    // their values are final; one more (convergent) pass promotes them.
    let provisional: Vec<Context> = engine
        .calls
        .iter()
        .filter_map(|(ctx, state)| match state.result {
            CallResult::InProgress(_) => Some(ctx.clone()),
            CallResult::Done(_) => None,
        })
        .collect();
    for ctx in provisional {
        engine.infer_call(&ctx)?;
    }

    let calls = engine
        .calls
        .into_iter()
        .map(|(ctx, state)| {
            let result = match state.result {
                CallResult::Done(val) => val,
                CallResult::InProgress(val) => val,
            };
            (
                ctx,
                FrameResult {
                    result,
                    nodes: state.nodes,
                },
            )
        })
        .collect();

    engine.progress.finish();

    Ok(InferredProgram {
        program,
        entry_ctx,
        entry_result,
        calls,
        call_shapes: engine.call_shapes,
        interner: engine.interner,
    })
}

#[derive(Clone, Debug)]
enum CallResult {
    /// Current approximation; grows monotonically across fixpoint passes.
    InProgress(AbstractValue),
    Done(AbstractValue),
}

#[derive(Clone, Debug)]
struct CallState {
    result: CallResult,
    nodes: BTreeMap<NodeId, AbstractValue>,
    /// Pass stamp per node; a node is evaluated at most once per pass.
    node_stamps: BTreeMap<NodeId, u64>,
    pass: u64,
}

impl CallState {
    fn new() -> Self {
        CallState {
            result: CallResult::InProgress(AbstractValue::Bottom),
            nodes: BTreeMap::new(),
            node_stamps: BTreeMap::new(),
            pass: 0,
        }
    }

    fn approx(&self) -> AbstractValue {
        match &self.result {
            CallResult::InProgress(val) => val.clone(),
            CallResult::Done(val) => val.clone(),
        }
    }
}

struct Engine<'a, S: ProgressSession> {
    program: &'a Program,
    config: PassConfig,
    interner: Interner<CallContext>,
    calls: BTreeMap<Context, CallState>,
    call_shapes: BTreeMap<ShapeKey, BTreeSet<Vec<AbstractValue>>>,
    /// Frames whose fixpoint is currently running, outermost first. Re-entry
    /// into one of these is recursion and reads its approximation instead of
    /// descending again.
    active: Vec<Context>,
    /// Lowest `active` index whose approximation the current pass has read.
    /// A frame that converges while having read a *strictly outer* frame's
    /// approximation stays provisional; its dependents re-run it.
    lowest_read: usize,
    pass_counter: u64,
    progress: S,
}

impl<'a, S: ProgressSession> Engine<'a, S> {
    fn trace(&self) -> CallTrace {
        CallTrace {
            frames: self
                .active
                .iter()
                .map(|ctx| TraceFrame {
                    graph: ctx.graph,
                    argspec: display_argspec(&ctx.argspec),
                })
                .collect(),
        }
    }

    fn error(&self, kind: ErrorKind, node: Option<NodeId>) -> Error {
        Error {
            kind,
            node,
            trace: self.trace(),
        }
    }

    fn mismatch(&self, node: NodeId, left: &AbstractValue, right: &AbstractValue) -> Error {
        self.error(
            ErrorKind::TypeMismatch {
                left: left.to_string(),
                right: right.to_string(),
            },
            Some(node),
        )
    }

    fn intern_context(
        &mut self,
        parent: Option<Context>,
        graph: GraphId,
        argspec: Vec<AbstractValue>,
    ) -> Result<Context, Error> {
        if self.interner.len() >= self.config.context_limit {
            return Err(self.error(
                ErrorKind::NonTerminatingInference {
                    detail: format!(
                        "more than {} distinct call shapes; this usually means polymorphic \
                         recursion keeps inventing new argument shapes",
                        self.config.context_limit
                    ),
                },
                None,
            ));
        }
        Ok(self.interner.intern(CallContext {
            parent,
            graph,
            argspec,
        }))
    }

    fn infer_call(&mut self, ctx: &Context) -> Result<AbstractValue, Error> {
        if let Some(state) = self.calls.get(ctx) {
            match &state.result {
                CallResult::Done(val) => return Ok(val.clone()),
                CallResult::InProgress(val) => {
                    if let Some(pos) = self.active.iter().position(|frame| frame == ctx) {
                        self.lowest_read = self.lowest_read.min(pos);
                        return Ok(val.clone());
                    }
                    // Not on the stack: a provisional frame from an earlier
                    // cycle pass. Resume its fixpoint with whatever has been
                    // learned since.
                }
            }
        } else {
            self.calls.insert(ctx.clone(), CallState::new());
        }
        self.run_fixpoint(ctx)
    }

    fn run_fixpoint(&mut self, ctx: &Context) -> Result<AbstractValue, Error> {
        let my_pos = self.active.len();
        self.active.push(ctx.clone());
        let saved_low = std::mem::replace(&mut self.lowest_read, usize::MAX);

        let ret = self.program.graphs[ctx.graph].ret;

        let mut iter = 0;
        let outcome = loop {
            if iter >= self.config.fixpoint_iter_limit {
                break Err(self.error(
                    ErrorKind::NonTerminatingInference {
                        detail: format!(
                            "no fixpoint for '{}' after {} passes",
                            self.program.graph_name(ctx.graph),
                            iter
                        ),
                    },
                    None,
                ));
            }
            iter += 1;

            self.lowest_read = usize::MAX;
            self.pass_counter += 1;
            let state = self.calls.get_mut(ctx).unwrap();
            state.pass = self.pass_counter;
            let prev = state.approx();

            let result = match self.eval_node(ctx, ret) {
                Ok(result) => result,
                Err(err) => break Err(err),
            };
            let pass_low = self.lowest_read;

            let joined = match join(&prev, &result) {
                Ok(joined) => joined,
                Err(_) => break Err(self.mismatch(ret, &prev, &result)),
            };

            let state = self.calls.get_mut(ctx).unwrap();
            if pass_low == usize::MAX {
                // The pass read no in-progress approximation at all, so the
                // result is already exact; no iteration needed. (The common,
                // non-recursive case.)
                state.result = CallResult::Done(joined.clone());
                self.progress.update(1);
                break Ok(joined);
            }
            if joined == prev {
                if pass_low < my_pos {
                    // Converged relative to an outer frame that is itself
                    // still settling; stay provisional so it re-runs us.
                    state.result = CallResult::InProgress(joined.clone());
                } else {
                    state.result = CallResult::Done(joined.clone());
                    self.progress.update(1);
                }
                break Ok(joined);
            }
            state.result = CallResult::InProgress(joined);
        };

        self.active.pop();

        // Reads of frames that are still on the caller's stack are the
        // caller's reads too; reads of our own (now popped) frame are not.
        let pass_low = self.lowest_read;
        self.lowest_read = if pass_low < my_pos {
            saved_low.min(pass_low)
        } else {
            saved_low
        };

        outcome
    }

    fn eval_node(&mut self, ctx: &Context, node: NodeId) -> Result<AbstractValue, Error> {
        // A node is always evaluated under the frame of the graph that owns
        // it; this is what makes free-variable references read the capturing
        // call's values rather than the referencing call's.
        let frame = match self.program.node_owner(node) {
            None => ctx.clone(),
            Some(owner) if owner == ctx.graph => ctx.clone(),
            Some(owner) => ctx
                .find_frame(owner)
                .unwrap_or_else(|| unreachable!("free reference escapes its lexical scope")),
        };

        let state = &self.calls[&frame];
        if state.node_stamps.get(&node) == Some(&state.pass) {
            return Ok(state.nodes[&node].clone());
        }

        let val = stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
            self.eval_node_inner(&frame, node)
        })?;

        let state = self.calls.get_mut(&frame).unwrap();
        let prev = state
            .nodes
            .get(&node)
            .cloned()
            .unwrap_or(AbstractValue::Bottom);
        let merged = match join(&prev, &val) {
            Ok(merged) => merged,
            Err(_) => return Err(self.mismatch(node, &prev, &val)),
        };
        let state = self.calls.get_mut(&frame).unwrap();
        let pass = state.pass;
        state.nodes.insert(node, merged.clone());
        state.node_stamps.insert(node, pass);
        Ok(merged)
    }

    fn eval_node_inner(&mut self, frame: &Context, node: NodeId) -> Result<AbstractValue, Error> {
        match &self.program.nodes[node] {
            Node::Const(val) => self.lift_const(frame, node, *val),

            Node::Param { index, .. } => Ok(frame.argspec[*index].clone()),

            Node::App { func, args, .. } => {
                let func_val = self.eval_node(frame, *func)?;
                let arg_vals = args
                    .iter()
                    .map(|&arg| self.eval_node(frame, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(frame, node, &func_val, &arg_vals)
            }
        }
    }

    fn lift_const(
        &mut self,
        frame: &Context,
        node: NodeId,
        val: Const,
    ) -> Result<AbstractValue, Error> {
        match val {
            Const::Bool(val) => Ok(AbstractValue::BoolConst(val)),
            Const::Int(val) => Ok(AbstractValue::IntConst(val)),
            Const::Float(_) => Ok(AbstractValue::Float),
            Const::Prim(intr) => Ok(AbstractValue::Func(FuncRep::singleton(FuncCase::Prim(
                intr,
            )))),
            Const::Ctor(record) => Ok(AbstractValue::Func(FuncRep::singleton(FuncCase::Ctor(
                record,
            )))),
            Const::Type(kind) => Ok(AbstractValue::TypeRef(kind)),
            Const::Graph(graph) => {
                let scope = match self.program.graphs[graph].parent {
                    None => None,
                    Some(parent) => Some(frame.find_frame(parent).unwrap_or_else(|| {
                        unreachable!("graph referenced outside its lexical scope")
                    })),
                };
                Ok(AbstractValue::Func(FuncRep::singleton(FuncCase::Graph {
                    graph,
                    scope,
                    origin: node,
                })))
            }
        }
    }

    fn apply(
        &mut self,
        frame: &Context,
        node: NodeId,
        func_val: &AbstractValue,
        args: &[AbstractValue],
    ) -> Result<AbstractValue, Error> {
        let rep = match func_val {
            AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
            AbstractValue::Func(rep) => rep,
            other => {
                return Err(self.error(
                    ErrorKind::TypeMismatch {
                        left: other.to_string(),
                        right: "a callable".to_owned(),
                    },
                    Some(node),
                ))
            }
        };

        if rep.0.is_empty() {
            return Err(self.error(ErrorKind::AmbiguousCall, Some(node)));
        }

        // A polymorphic function position applies every candidate at the
        // same arguments; the call's value is the join of the outcomes.
        let mut result = AbstractValue::Bottom;
        for case in rep.0.clone() {
            let val = self.apply_case(frame, node, &case, args)?;
            result = match join(&result, &val) {
                Ok(joined) => joined,
                Err(_) => return Err(self.mismatch(node, &result, &val)),
            };
        }
        Ok(result)
    }

    fn apply_case(
        &mut self,
        frame: &Context,
        node: NodeId,
        case: &FuncCase,
        args: &[AbstractValue],
    ) -> Result<AbstractValue, Error> {
        match case {
            FuncCase::Graph {
                graph,
                scope,
                origin,
            } => {
                let params = self.program.graphs[*graph].params.len();
                if args.len() != params {
                    return Err(self.error(
                        ErrorKind::TypeMismatch {
                            left: format!("{} arguments", args.len()),
                            right: format!(
                                "'{}' with {} parameters",
                                self.program.graph_name(*graph),
                                params
                            ),
                        },
                        Some(node),
                    ));
                }

                // Arguments still pending a fixpoint would seed junk cache
                // keys; the call's value is simply not known yet.
                if args.iter().any(contains_bottom) {
                    return Ok(AbstractValue::Bottom);
                }

                let argspec: Vec<AbstractValue> = args.iter().map(broaden_abstract).collect();
                self.call_shapes
                    .entry((*graph, scope.clone(), *origin))
                    .or_default()
                    .insert(argspec.clone());

                let child = self.intern_context(scope.clone(), *graph, argspec)?;
                self.infer_call(&child)
            }

            FuncCase::Prim(intr) => self.apply_prim(frame, node, *intr, args),

            FuncCase::Ctor(record) => {
                let fields = self.program.records[*record].fields.len();
                if args.len() != fields {
                    return Err(self.error(
                        ErrorKind::TypeMismatch {
                            left: format!("{} arguments", args.len()),
                            right: format!(
                                "constructor '{}' with {} fields",
                                self.program.records[*record].name, fields
                            ),
                        },
                        Some(node),
                    ));
                }
                Ok(AbstractValue::Record(*record, args.to_vec()))
            }

            FuncCase::Partial { func, bound } => {
                let mut full = bound.clone();
                full.extend(args.iter().cloned());
                self.apply_case(frame, node, func, &full)
            }
        }
    }

    fn apply_prim(
        &mut self,
        frame: &Context,
        node: NodeId,
        intr: Intrinsic,
        args: &[AbstractValue],
    ) -> Result<AbstractValue, Error> {
        if let Some(sig) = scalar_sig(intr) {
            return self.apply_scalar(node, intr, sig, args);
        }

        match intr {
            Intrinsic::Switch => {
                let [cond, on_true, on_false] = self.expect_args::<3>(node, intr, args)?;
                match cond {
                    AbstractValue::Bottom => Ok(AbstractValue::Bottom),
                    AbstractValue::BoolConst(true) => Ok(on_true.clone()),
                    AbstractValue::BoolConst(false) => Ok(on_false.clone()),
                    AbstractValue::Bool => match join(on_true, on_false) {
                        Ok(joined) => Ok(joined),
                        Err(_) => Err(self.mismatch(node, on_true, on_false)),
                    },
                    _ => Err(self.undefined(node, intr, args)),
                }
            }

            Intrinsic::Partial => {
                let (func, bound) = match args.split_first() {
                    Some(split) => split,
                    None => return Err(self.undefined(node, intr, args)),
                };
                let rep = match func {
                    AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
                    AbstractValue::Func(rep) => rep,
                    _ => return Err(self.undefined(node, intr, args)),
                };
                let cases = rep
                    .0
                    .iter()
                    .map(|case| FuncCase::Partial {
                        func: Box::new(case.clone()),
                        bound: bound.to_vec(),
                    })
                    .collect();
                Ok(AbstractValue::Func(FuncRep(cases)))
            }

            Intrinsic::HasType => {
                let [val, tag] = self.expect_args::<2>(node, intr, args)?;
                let kind = match tag {
                    AbstractValue::TypeRef(kind) => *kind,
                    AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
                    _ => return Err(self.undefined(node, intr, args)),
                };
                match matches_kind(val, kind) {
                    Some(result) => Ok(AbstractValue::BoolConst(result)),
                    None => Ok(AbstractValue::Bottom),
                }
            }

            Intrinsic::TupleNew => Ok(AbstractValue::Tuple(args.to_vec())),

            Intrinsic::TupleGet => {
                let [tuple, index] = self.expect_args::<2>(node, intr, args)?;
                let items = match tuple {
                    AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
                    AbstractValue::Tuple(items) => items,
                    _ => return Err(self.undefined(node, intr, args)),
                };
                match index {
                    AbstractValue::IntConst(i) if (0..items.len() as i64).contains(i) => {
                        Ok(items[*i as usize].clone())
                    }
                    AbstractValue::Bottom => Ok(AbstractValue::Bottom),
                    _ => Err(self.undefined(node, intr, args)),
                }
            }

            Intrinsic::FieldGet => {
                let [record, index] = self.expect_args::<2>(node, intr, args)?;
                let fields = match record {
                    AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
                    AbstractValue::Record(_, fields) => fields,
                    _ => return Err(self.undefined(node, intr, args)),
                };
                match index {
                    AbstractValue::IntConst(i) if (0..fields.len() as i64).contains(i) => {
                        Ok(fields[*i as usize].clone())
                    }
                    AbstractValue::Bottom => Ok(AbstractValue::Bottom),
                    _ => Err(self.undefined(node, intr, args)),
                }
            }

            Intrinsic::ArrayMap => {
                let [func, array] = self.expect_args::<2>(node, intr, args)?;
                let elem = match array {
                    AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
                    AbstractValue::Array(elem) => (**elem).clone(),
                    _ => return Err(self.undefined(node, intr, args)),
                };
                let mapped = self.apply(frame, node, func, &[elem])?;
                if contains_bottom(&mapped) {
                    return Ok(AbstractValue::Bottom);
                }
                Ok(AbstractValue::Array(Box::new(mapped)))
            }

            Intrinsic::ListMap => {
                let [func, list] = self.expect_args::<2>(node, intr, args)?;
                let elem = match list {
                    AbstractValue::Bottom => return Ok(AbstractValue::Bottom),
                    AbstractValue::List(elem) => (**elem).clone(),
                    _ => return Err(self.undefined(node, intr, args)),
                };
                let mapped = self.apply(frame, node, func, &[elem])?;
                if contains_bottom(&mapped) {
                    return Ok(AbstractValue::Bottom);
                }
                Ok(AbstractValue::List(Box::new(mapped)))
            }

            _ => unreachable!("scalar intrinsic fell through its signature table"),
        }
    }

    fn apply_scalar(
        &mut self,
        node: NodeId,
        intr: Intrinsic,
        sig: ScalarSig,
        args: &[AbstractValue],
    ) -> Result<AbstractValue, Error> {
        if args.iter().any(|arg| matches!(arg, AbstractValue::Bottom)) {
            return Ok(AbstractValue::Bottom);
        }

        match sig {
            ScalarSig::Arith { arity } => {
                if args.len() != arity || !args.iter().all(is_numeric) {
                    return Err(self.undefined(node, intr, args));
                }
                // Mixed int/float operands promote to float; this is an
                // arithmetic rule, not a join rule.
                if args.iter().any(|arg| matches!(arg, AbstractValue::Float)) {
                    Ok(AbstractValue::Float)
                } else {
                    Ok(AbstractValue::Int)
                }
            }

            ScalarSig::Compare => {
                let both_bool = args
                    .iter()
                    .all(|arg| matches!(arg, AbstractValue::Bool | AbstractValue::BoolConst(_)));
                let equality = matches!(intr, Intrinsic::Eq | Intrinsic::Ne);
                if args.len() != 2 || !(args.iter().all(is_numeric) || (both_bool && equality)) {
                    return Err(self.undefined(node, intr, args));
                }
                Ok(AbstractValue::Bool)
            }

            ScalarSig::Logic { arity } => {
                if args.len() != arity
                    || !args
                        .iter()
                        .all(|arg| matches!(arg, AbstractValue::Bool | AbstractValue::BoolConst(_)))
                {
                    return Err(self.undefined(node, intr, args));
                }
                match (intr, args) {
                    (Intrinsic::Not, [AbstractValue::BoolConst(val)]) => {
                        Ok(AbstractValue::BoolConst(!val))
                    }
                    _ => Ok(AbstractValue::Bool),
                }
            }
        }
    }

    fn expect_args<'b, const N: usize>(
        &self,
        node: NodeId,
        intr: Intrinsic,
        args: &'b [AbstractValue],
    ) -> Result<&'b [AbstractValue; N], Error> {
        args.try_into()
            .map_err(|_| self.undefined(node, intr, args))
    }

    fn undefined(&self, node: NodeId, intr: Intrinsic, args: &[AbstractValue]) -> Error {
        self.error(
            ErrorKind::UndefinedOperation {
                prim: intrinsic_to_name(intr).debug_name(),
                operands: display_argspec(args),
            },
            Some(node),
        )
    }
}

fn is_numeric(val: &AbstractValue) -> bool {
    matches!(
        val,
        AbstractValue::Int | AbstractValue::IntConst(_) | AbstractValue::Float
    )
}
