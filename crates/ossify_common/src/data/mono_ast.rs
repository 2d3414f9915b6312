use crate::data::graph_ast::{F64Bits, RecordDef, RecordId};
use crate::data::intrinsics::Intrinsic;
use id_collections::{id_type, IdVec};

#[id_type]
pub struct GraphId(pub usize);

#[id_type]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Type {
    Bool,
    Int,
    Float,
    Tuple(Vec<Type>),
    Record(RecordId),
    Array(Box<Type>),
    List(Box<Type>),
    Func(Vec<Type>, Box<Type>),
    /// The type of a value that is provably never read (a dead argument's
    /// placeholder).
    Opaque,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Const {
    Bool(bool),
    Int(i64),
    Float(F64Bits),
    Graph(GraphId),
    Prim(Intrinsic),
    Ctor(RecordId),
    /// Dead placeholder; evaluating it is fine, reading through it is not.
    Opaque,
}

#[derive(Clone, Debug)]
pub enum Node {
    Const(Const),
    Param {
        owner: GraphId,
        index: usize,
        type_: Type,
    },
    App {
        owner: GraphId,
        func: NodeId,
        args: Vec<NodeId>,
        type_: Type,
    },
}

#[derive(Clone, Debug)]
pub struct GraphDef {
    pub name: Option<String>,
    /// Instance (not template) parent: captures reference nodes of exactly
    /// this emitted graph, never a sibling instance of the same template.
    pub parent: Option<GraphId>,
    pub params: Vec<NodeId>,
    pub ret: NodeId,
    pub ret_type: Type,
}

/// The specializer's output: one graph per reachable (graph, argument
/// shapes, captured bindings) key, every application resolved, every node
/// annotated with a concrete type.
#[derive(Clone, Debug)]
pub struct Program {
    pub graphs: IdVec<GraphId, GraphDef>,
    pub nodes: IdVec<NodeId, Node>,
    pub records: IdVec<RecordId, RecordDef>,
    pub entry: GraphId,
}

impl Program {
    pub fn node_owner(&self, node: NodeId) -> Option<GraphId> {
        match &self.nodes[node] {
            Node::Const(_) => None,
            Node::Param { owner, .. } => Some(*owner),
            Node::App { owner, .. } => Some(*owner),
        }
    }

    pub fn param_types(&self, graph: GraphId) -> Vec<Type> {
        self.graphs[graph]
            .params
            .iter()
            .map(|&param| match &self.nodes[param] {
                Node::Param { type_, .. } => type_.clone(),
                _ => unreachable!(),
            })
            .collect()
    }
}
