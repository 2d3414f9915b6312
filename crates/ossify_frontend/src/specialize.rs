use crate::infer::InferredProgram;
use ossify_common::data::abstract_ast::{
    broaden_abstract, display_argspec, AbstractValue, Context, FuncCase, FuncRep,
};
use ossify_common::data::graph_ast::{self as graph, GraphId, NodeId, Program};
use ossify_common::data::intrinsics::Intrinsic;
use ossify_common::data::mono_ast as mono;
use ossify_common::report_error::{write_titled, Reportable};
use ossify_common::util::instance_queue::InstanceQueue;
use ossify_common::util::progress_logger::{ProgressLogger, ProgressSession};
use id_collections::{Id, IdVec};
use std::collections::BTreeMap;
use std::io;
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum ErrorKind {
    #[error("cannot emit a single target for this function value: {detail}")]
    SpecializationFailure { detail: String },
    #[error("a value captured from '{owner}' is out of scope here but still used")]
    IllegalCapture { owner: String },
}

#[derive(Clone, Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub node: NodeId,
    /// The graph instance being emitted, with its argument shapes.
    pub graph: GraphId,
    pub argspec: String,
}

impl Reportable for Error {
    fn report(&self, dest: &mut impl io::Write, program: &Program) -> io::Result<()> {
        let title = match &self.kind {
            ErrorKind::SpecializationFailure { .. } => "Specialization Failure",
            ErrorKind::IllegalCapture { .. } => "Illegal Capture",
        };
        write_titled(dest, title, &self.kind.to_string())?;
        writeln!(
            dest,
            "  while emitting {} {}",
            program.graph_name(self.graph),
            self.argspec
        )
    }

    fn exit_status(&self) -> i32 {
        1
    }
}

/// Emits one concrete graph per reachable (graph, argument shapes, captured
/// bindings) key, resolving every application's function position against the
/// inference caches.
pub fn specialize_program(
    inferred: &InferredProgram<'_>,
    progress: impl ProgressLogger,
) -> Result<mono::Program, Error> {
    let mut spec = Specializer {
        inferred,
        instances: InstanceQueue::new(),
        node_maps: BTreeMap::new(),
        graphs: Vec::new(),
        nodes: IdVec::new(),
    };

    let mut session = progress.start_session(Some(inferred.num_frames()));

    let entry = spec.instances.resolve(inferred.entry_ctx.clone());
    while let Some((mono_id, ctx)) = spec.instances.pop_pending() {
        // Instances are emitted in id order, so pushing each finished def
        // keeps the vector indexed by id.
        assert_eq!(mono_id.to_index(), spec.graphs.len());
        let def = spec.emit_graph(mono_id, &ctx)?;
        spec.graphs.push(def);
        session.update(1);
    }

    session.finish();

    Ok(mono::Program {
        graphs: IdVec::from_vec(spec.graphs),
        nodes: spec.nodes,
        records: inferred.program.records.clone(),
        entry,
    })
}

struct Specializer<'a, 'p> {
    inferred: &'a InferredProgram<'p>,
    instances: InstanceQueue<Context, mono::GraphId>,
    /// Source-node to emitted-node map per instance. Parent entries gain
    /// nodes after emission when a child instance captures something the
    /// parent's own body never demanded.
    node_maps: BTreeMap<Context, BTreeMap<NodeId, mono::NodeId>>,
    graphs: Vec<mono::GraphDef>,
    nodes: IdVec<mono::NodeId, mono::Node>,
}

impl<'a, 'p> Specializer<'a, 'p> {
    fn program(&self) -> &'p Program {
        self.inferred.program
    }

    fn fail(&self, ctx: &Context, node: NodeId, kind: ErrorKind) -> Error {
        Error {
            kind,
            node,
            graph: ctx.graph,
            argspec: display_argspec(&ctx.argspec),
        }
    }

    fn emit_graph(&mut self, mono_id: mono::GraphId, ctx: &Context) -> Result<mono::GraphDef, Error> {
        let def = &self.program().graphs[ctx.graph];

        let mut map = BTreeMap::new();
        for (index, &param) in def.params.iter().enumerate() {
            let type_ = self.type_of(&ctx.argspec[index]);
            let mono_param = self.nodes.push(mono::Node::Param {
                owner: mono_id,
                index,
                type_,
            });
            map.insert(param, mono_param);
        }
        self.node_maps.insert(ctx.clone(), map);

        let ret = self.clone_node(ctx, def.ret)?;
        let ret_type = match self.inferred.result_of(ctx) {
            Some(result) => self.type_of(result),
            None => unreachable!("emitting an instance inference never visited"),
        };

        let parent = ctx.parent.as_ref().map(|parent_ctx| {
            self.instances
                .lookup(parent_ctx)
                .unwrap_or_else(|| unreachable!("child instance emitted before its parent"))
        });

        Ok(mono::GraphDef {
            name: def.name.clone(),
            parent,
            params: self.program().graphs[ctx.graph]
                .params
                .iter()
                .map(|param| self.node_maps[ctx][param])
                .collect(),
            ret,
            ret_type,
        })
    }

    fn clone_node(&mut self, ctx: &Context, node: NodeId) -> Result<mono::NodeId, Error> {
        // Nodes are cloned into the instance of the graph that owns them;
        // a free reference lands in the enclosing instance and the child
        // simply points at it.
        let frame = match self.program().node_owner(node) {
            None => ctx.clone(),
            Some(owner) if owner == ctx.graph => ctx.clone(),
            Some(owner) => match ctx.find_frame(owner) {
                Some(frame) => frame,
                None => {
                    // Reaching here means a retained node actually reads the
                    // capture; an unread capture is simply never cloned.
                    return Err(self.fail(
                        ctx,
                        node,
                        ErrorKind::IllegalCapture {
                            owner: self.program().graph_name(owner),
                        },
                    ));
                }
            },
        };

        if let Some(&existing) = self.node_maps[&frame].get(&node) {
            return Ok(existing);
        }

        let mono_node = stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
            self.clone_node_inner(&frame, node)
        })?;
        self.node_maps.get_mut(&frame).unwrap().insert(node, mono_node);
        Ok(mono_node)
    }

    fn clone_node_inner(&mut self, ctx: &Context, node: NodeId) -> Result<mono::NodeId, Error> {
        let mono_graph = self
            .instances
            .lookup(ctx)
            .unwrap_or_else(|| unreachable!("cloning into an unresolved instance"));

        match &self.program().nodes[node] {
            graph::Node::Param { .. } => {
                unreachable!("parameters are mapped when their instance is created")
            }

            graph::Node::Const(val) => self.emit_const(ctx, node, *val),

            graph::Node::App { func, args, .. } => {
                let app_val = self.node_value(ctx, node);

                // A switch on a statically known condition specializes to
                // the selected branch alone; the unselected branch is never
                // visited, so a failure it would have produced never surfaces.
                if let Some((cond, on_true, on_false)) = self.as_switch(ctx, *func, args) {
                    match self.node_value(ctx, cond) {
                        AbstractValue::BoolConst(true) => return self.clone_node(ctx, on_true),
                        AbstractValue::BoolConst(false) => return self.clone_node(ctx, on_false),
                        _ => {}
                    }
                }

                // Statically resolved boolean tests (`hastype` chains) fold
                // to constants.
                if let AbstractValue::BoolConst(val) = app_val {
                    return Ok(self
                        .nodes
                        .push(mono::Node::Const(mono::Const::Bool(val))));
                }

                let func_val = self.node_value(ctx, *func);
                let rep = match &func_val {
                    AbstractValue::Func(rep) => rep.clone(),
                    other => {
                        return Err(self.fail(
                            ctx,
                            node,
                            ErrorKind::SpecializationFailure {
                                detail: format!(
                                    "function position has shape {} after inference",
                                    other
                                ),
                            },
                        ))
                    }
                };

                let site_args: Vec<AbstractValue> = args
                    .iter()
                    .map(|&arg| broaden_abstract(&self.node_value(ctx, arg)))
                    .collect();

                let func_mono = self.resolve_call_target(ctx, node, *func, &rep, &site_args)?;
                let args_mono = args
                    .iter()
                    .map(|&arg| self.clone_node(ctx, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let type_ = self.type_of(&app_val);

                Ok(self.nodes.push(mono::Node::App {
                    owner: mono_graph,
                    func: func_mono,
                    args: args_mono,
                    type_,
                }))
            }
        }
    }

    /// Rewrites an application's function position. A single graph candidate
    /// becomes a direct reference to the instance specialized for this
    /// site's argument shapes when the reference can be built here: the
    /// function position is already a constant, or the callee captures
    /// nothing (which also resolves capture-free calls through indirection,
    /// `add2()(x, x)` style). A candidate with captures reached through a
    /// computed value must keep the closure-producing expression — a direct
    /// reference would rebind its captures to whatever frame of the same
    /// template happens to enclose the call site. Primitives and
    /// constructors capture nothing and are always direct; multi-candidate
    /// positions stay as (monomorphic) runtime dispatch.
    fn resolve_call_target(
        &mut self,
        ctx: &Context,
        node: NodeId,
        func: NodeId,
        rep: &FuncRep,
        site_args: &[AbstractValue],
    ) -> Result<mono::NodeId, Error> {
        if rep.0.len() == 1 {
            let case = rep.0.iter().next().unwrap();
            match case {
                FuncCase::Graph { graph, scope, .. } => {
                    let child_ctx =
                        self.inferred
                            .context(scope.clone(), *graph, site_args.to_vec());
                    if self.inferred.result_of(&child_ctx).is_none() {
                        return Err(self.fail(
                            ctx,
                            node,
                            ErrorKind::SpecializationFailure {
                                detail: format!(
                                    "'{}' was never inferred at {}",
                                    self.program().graph_name(*graph),
                                    display_argspec(site_args)
                                ),
                            },
                        ));
                    }
                    let const_ref =
                        matches!(self.program().nodes[func], graph::Node::Const(_));
                    if const_ref || scope.is_none() {
                        let target = self.instances.resolve(child_ctx);
                        return Ok(self
                            .nodes
                            .push(mono::Node::Const(mono::Const::Graph(target))));
                    }
                    self.clone_node(ctx, func)
                }

                FuncCase::Prim(intr) => Ok(self
                    .nodes
                    .push(mono::Node::Const(mono::Const::Prim(*intr)))),

                FuncCase::Ctor(record) => Ok(self
                    .nodes
                    .push(mono::Node::Const(mono::Const::Ctor(*record)))),

                FuncCase::Partial { .. } => self.clone_node(ctx, func),
            }
        } else {
            // Genuine runtime dispatch; each candidate's instance is
            // resolved where its creating constant is cloned.
            self.clone_node(ctx, func)
        }
    }

    fn emit_const(
        &mut self,
        ctx: &Context,
        node: NodeId,
        val: graph::Const,
    ) -> Result<mono::NodeId, Error> {
        let mono_const = match val {
            graph::Const::Bool(val) => mono::Const::Bool(val),
            graph::Const::Int(val) => mono::Const::Int(val),
            graph::Const::Float(val) => mono::Const::Float(val),
            graph::Const::Prim(intr) => mono::Const::Prim(intr),
            graph::Const::Ctor(record) => mono::Const::Ctor(record),
            graph::Const::Type(_) => {
                unreachable!("type tags are consumed by hastype folding")
            }
            graph::Const::Graph(_) => {
                let (graph, scope) = match self.node_value(ctx, node) {
                    AbstractValue::Func(rep) => match rep.0.iter().next() {
                        Some(FuncCase::Graph { graph, scope, .. }) => (*graph, scope.clone()),
                        _ => unreachable!("graph constant inferred as a non-graph"),
                    },
                    _ => unreachable!("graph constant inferred as a non-function"),
                };

                // A graph flowing as a value: resolve it through the call
                // shapes observed for this particular mention.
                let shapes: Vec<_> = self
                    .inferred
                    .call_shapes_of(graph, &scope, node)
                    .cloned()
                    .collect();
                match shapes.len() {
                    // Never called anywhere: the value is dead, and a
                    // placeholder keeps the signature monomorphic without
                    // blocking emission.
                    0 => mono::Const::Opaque,
                    1 => {
                        let child_ctx =
                            self.inferred.context(scope, graph, shapes[0].clone());
                        mono::Const::Graph(self.instances.resolve(child_ctx))
                    }
                    _ => {
                        return Err(self.fail(
                            ctx,
                            node,
                            ErrorKind::SpecializationFailure {
                                detail: format!(
                                    "'{}' flows as a value but is called at {} different \
                                     shapes: {}",
                                    self.program().graph_name(graph),
                                    shapes.len(),
                                    shapes
                                        .iter()
                                        .map(|shape| display_argspec(shape))
                                        .collect::<Vec<_>>()
                                        .join(", ")
                                ),
                            },
                        ))
                    }
                }
            }
        };

        Ok(self.nodes.push(mono::Node::Const(mono_const)))
    }

    fn as_switch(
        &self,
        ctx: &Context,
        func: NodeId,
        args: &[NodeId],
    ) -> Option<(NodeId, NodeId, NodeId)> {
        match self.node_value(ctx, func) {
            AbstractValue::Func(rep) if rep.0.len() == 1 => match rep.0.iter().next() {
                Some(FuncCase::Prim(Intrinsic::Switch)) if args.len() == 3 => {
                    Some((args[0], args[1], args[2]))
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// The inferred value of `node` as seen from `ctx`. Free references are
    /// recorded under their owning frame, mirroring the engine's evaluation.
    fn node_value(&self, ctx: &Context, node: NodeId) -> AbstractValue {
        let frame = match self.program().node_owner(node) {
            None => ctx.clone(),
            Some(owner) if owner == ctx.graph => ctx.clone(),
            Some(owner) => ctx
                .find_frame(owner)
                .unwrap_or_else(|| unreachable!("free reference escapes its lexical scope")),
        };
        self.inferred
            .node_value(&frame, node)
            .cloned()
            .unwrap_or_else(|| unreachable!("specializing a node inference never visited"))
    }

    fn type_of(&self, val: &AbstractValue) -> mono::Type {
        match val {
            AbstractValue::Bool | AbstractValue::BoolConst(_) => mono::Type::Bool,
            AbstractValue::Int | AbstractValue::IntConst(_) => mono::Type::Int,
            AbstractValue::Float => mono::Type::Float,
            AbstractValue::Tuple(items) => {
                mono::Type::Tuple(items.iter().map(|item| self.type_of(item)).collect())
            }
            AbstractValue::Record(record, _) => mono::Type::Record(*record),
            AbstractValue::Array(elem) => mono::Type::Array(Box::new(self.type_of(elem))),
            AbstractValue::List(elem) => mono::Type::List(Box::new(self.type_of(elem))),
            AbstractValue::Func(rep) => self.func_type(rep),
            // Dead or divergent positions; provably never read.
            AbstractValue::Bottom | AbstractValue::TypeRef(_) => mono::Type::Opaque,
        }
    }

    fn func_type(&self, rep: &FuncRep) -> mono::Type {
        // All candidates of a monomorphic function value share a signature;
        // the first graph candidate with a unique observed call shape
        // provides it. A value never called has no signature to give and
        // stays opaque.
        for case in &rep.0 {
            if let FuncCase::Graph {
                graph,
                scope,
                origin,
            } = case
            {
                let shapes: Vec<_> = self
                    .inferred
                    .call_shapes_of(*graph, scope, *origin)
                    .collect();
                if let [shape] = shapes.as_slice() {
                    let child_ctx =
                        self.inferred
                            .context(scope.clone(), *graph, (*shape).clone());
                    if let Some(result) = self.inferred.result_of(&child_ctx) {
                        let params = shape.iter().map(|arg| self.type_of(arg)).collect();
                        return mono::Type::Func(params, Box::new(self.type_of(result)));
                    }
                }
            }
        }
        mono::Type::Opaque
    }
}
