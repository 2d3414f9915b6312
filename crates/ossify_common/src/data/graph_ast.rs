use crate::data::intrinsics::{Intrinsic, TypeKind};
use crate::intrinsic_config::intrinsic_by_name;
use id_collections::{id_type, Count, Id, IdVec};

#[id_type]
pub struct GraphId(pub usize);

#[id_type]
pub struct NodeId(pub usize);

#[id_type]
pub struct RecordId(pub usize);

/// An `f64` constant stored by bit pattern so the IR stays `Eq + Ord` and can
/// be used in ordered maps. The derived ordering is the bit-pattern order,
/// not the numeric order; nothing in the compiler orders floats numerically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct F64Bits(pub u64);

impl F64Bits {
    pub fn from_f64(val: f64) -> Self {
        F64Bits(val.to_bits())
    }

    pub fn to_f64(self) -> f64 {
        f64::from_bits(self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Const {
    Bool(bool),
    Int(i64),
    Float(F64Bits),
    Graph(GraphId),
    Prim(Intrinsic),
    Ctor(RecordId),
    Type(TypeKind),
}

#[derive(Clone, Debug)]
pub enum Node {
    /// Constants have no owning graph; they may be referenced from anywhere.
    /// Each textual mention in the source is a distinct node, which is what
    /// lets the specializer keep per-mention call books.
    Const(Const),
    Param { owner: GraphId, index: usize },
    App {
        owner: GraphId,
        func: NodeId,
        args: Vec<NodeId>,
    },
}

#[derive(Clone, Debug)]
pub struct GraphDef {
    pub name: Option<String>,
    /// Lexically enclosing graph. A graph whose body references nodes owned
    /// by an ancestor is a closure template.
    pub parent: Option<GraphId>,
    pub params: Vec<NodeId>,
    pub ret: NodeId,
}

#[derive(Clone, Debug)]
pub struct RecordDef {
    pub name: String,
    /// Field access in the IR is positional; the parser resolves names to
    /// indices. Names are kept for shape identity and diagnostics.
    pub fields: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct Program {
    pub graphs: IdVec<GraphId, GraphDef>,
    pub nodes: IdVec<NodeId, Node>,
    pub records: IdVec<RecordId, RecordDef>,
    pub entry: GraphId,
}

impl Program {
    /// The graph whose call frame binds this node, or `None` for constants.
    pub fn node_owner(&self, node: NodeId) -> Option<GraphId> {
        match &self.nodes[node] {
            Node::Const(_) => None,
            Node::Param { owner, .. } => Some(*owner),
            Node::App { owner, .. } => Some(*owner),
        }
    }

    pub fn graph_name(&self, graph: GraphId) -> String {
        match &self.graphs[graph].name {
            Some(name) => name.clone(),
            None => format!("graph#{}", graph.0),
        }
    }
}

/// Concrete values: entry-point arguments and evaluator inputs/results.
/// Function values exist only inside the evaluator, not here.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Tuple(Vec<Value>),
    Record(RecordId, Vec<Value>),
    Array(Vec<Value>),
    List(Vec<Value>),
}

/// Construction API for the parser (and for tests). Misuse panics; this runs
/// before any user program can be at fault.
#[derive(Clone, Debug)]
pub struct ProgramBuilder {
    graph_count: Count<GraphId>,
    graphs: Vec<PendingGraph>,
    nodes: IdVec<NodeId, Node>,
    records: IdVec<RecordId, RecordDef>,
}

#[derive(Clone, Debug)]
struct PendingGraph {
    name: Option<String>,
    parent: Option<GraphId>,
    params: Vec<NodeId>,
    ret: Option<NodeId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder {
            graph_count: Count::new(),
            graphs: Vec::new(),
            nodes: IdVec::new(),
            records: IdVec::new(),
        }
    }

    pub fn add_record(&mut self, name: impl Into<String>, fields: &[&str]) -> RecordId {
        self.records.push(RecordDef {
            name: name.into(),
            fields: fields.iter().map(|field| (*field).to_owned()).collect(),
        })
    }

    pub fn new_graph(&mut self, name: impl Into<String>, parent: Option<GraphId>) -> GraphId {
        self.graphs.push(PendingGraph {
            name: Some(name.into()),
            parent,
            params: Vec::new(),
            ret: None,
        });
        self.graph_count.inc()
    }

    pub fn param(&mut self, graph: GraphId) -> NodeId {
        let index = self.graphs[graph.to_index()].params.len();
        let node = self.nodes.push(Node::Param {
            owner: graph,
            index,
        });
        self.graphs[graph.to_index()].params.push(node);
        node
    }

    pub fn const_(&mut self, val: Const) -> NodeId {
        self.nodes.push(Node::Const(val))
    }

    pub fn bool_(&mut self, val: bool) -> NodeId {
        self.const_(Const::Bool(val))
    }

    pub fn int(&mut self, val: i64) -> NodeId {
        self.const_(Const::Int(val))
    }

    pub fn float(&mut self, val: f64) -> NodeId {
        self.const_(Const::Float(F64Bits::from_f64(val)))
    }

    pub fn graph_ref(&mut self, graph: GraphId) -> NodeId {
        self.const_(Const::Graph(graph))
    }

    pub fn prim(&mut self, intr: Intrinsic) -> NodeId {
        self.const_(Const::Prim(intr))
    }

    pub fn prim_named(&mut self, name: &str) -> NodeId {
        let intr = intrinsic_by_name(name)
            .unwrap_or_else(|| panic!("no intrinsic named {:?}", name));
        self.prim(intr)
    }

    pub fn ctor(&mut self, record: RecordId) -> NodeId {
        self.const_(Const::Ctor(record))
    }

    pub fn type_tag(&mut self, kind: TypeKind) -> NodeId {
        self.const_(Const::Type(kind))
    }

    pub fn app(&mut self, owner: GraphId, func: NodeId, args: Vec<NodeId>) -> NodeId {
        self.nodes.push(Node::App { owner, func, args })
    }

    /// Convenience for the common `prim(...)(args)` application shape.
    pub fn prim_app(&mut self, owner: GraphId, intr: Intrinsic, args: Vec<NodeId>) -> NodeId {
        let func = self.prim(intr);
        self.app(owner, func, args)
    }

    pub fn set_ret(&mut self, graph: GraphId, ret: NodeId) {
        let prev = self.graphs[graph.to_index()].ret.replace(ret);
        debug_assert!(prev.is_none());
    }

    pub fn finish(self, entry: GraphId) -> Program {
        let graphs = IdVec::from_vec(
            self.graphs
                .into_iter()
                .map(|pending| GraphDef {
                    ret: pending
                        .ret
                        .unwrap_or_else(|| panic!("graph {:?} has no return node", pending.name)),
                    name: pending.name,
                    parent: pending.parent,
                    params: pending.params,
                })
                .collect(),
        );

        Program {
            graphs,
            nodes: self.nodes,
            records: self.records,
            entry,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        ProgramBuilder::new()
    }
}
