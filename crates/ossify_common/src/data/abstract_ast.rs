use crate::data::graph_ast::{GraphId, NodeId, RecordId, Value};
use crate::data::intrinsics::{Intrinsic, TypeKind};
use crate::intrinsic_config::intrinsic_to_name;
use crate::util::intern::Interned;
use std::collections::BTreeSet;
use std::fmt;

/// One frame of abstract call state: a graph invoked at a specific argument
/// shape, linked to the frame it was (lexically) created under. A chain of
/// these is both an inference cache key and a closure-instance identity:
/// two instances of the same template with different captured bindings have
/// different chains.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallContext {
    pub parent: Option<Context>,
    pub graph: GraphId,
    pub argspec: Vec<AbstractValue>,
}

pub type Context = Interned<CallContext>;

impl Interned<CallContext> {
    /// The frame on this chain (including this one) owned by `graph`, if any.
    pub fn find_frame(&self, graph: GraphId) -> Option<Context> {
        let mut cursor = Some(self.clone());
        while let Some(frame) = cursor {
            if frame.graph == graph {
                return Some(frame);
            }
            cursor = frame.parent.clone();
        }
        None
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut cursor = self.parent.clone();
        while let Some(frame) = cursor {
            depth += 1;
            cursor = frame.parent.clone();
        }
        depth
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AbstractValue {
    /// Incomplete: the value of a computation whose fixpoint has not settled
    /// yet. Unit of `join`; never survives successful inference.
    Bottom,
    Bool,
    BoolConst(bool),
    Int,
    IntConst(i64),
    Float,
    Tuple(Vec<AbstractValue>),
    Record(RecordId, Vec<AbstractValue>),
    Array(Box<AbstractValue>),
    List(Box<AbstractValue>),
    Func(FuncRep),
    /// A type tag flowing as a value, consumed by `HasType`.
    TypeRef(TypeKind),
}

/// The set of callables a function-shaped value may be at runtime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncRep(pub BTreeSet<FuncCase>);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FuncCase {
    Graph {
        graph: GraphId,
        /// The frame chain at the point the reference was created; captures
        /// of the template resolve against this chain. `None` for top-level
        /// (closed) graphs.
        scope: Option<Context>,
        /// The constant node the reference came from. Two mentions of the
        /// same graph keep separate call-shape books, so each mention can
        /// resolve to its own specialization.
        origin: NodeId,
    },
    Prim(Intrinsic),
    Ctor(RecordId),
    Partial {
        func: Box<FuncCase>,
        bound: Vec<AbstractValue>,
    },
}

impl FuncRep {
    pub fn singleton(case: FuncCase) -> Self {
        FuncRep(BTreeSet::from([case]))
    }
}

/// Two shapes that cannot describe the same program point. The engine wraps
/// this with the offending node and call trace.
#[derive(Clone, Debug)]
pub struct Mismatch {
    pub left: AbstractValue,
    pub right: AbstractValue,
}

/// Least upper bound of two abstract values arriving at the same program
/// point along different paths. Exact scalar values widen to their kind;
/// candidate sets union; containers join pointwise.
pub fn join(a: &AbstractValue, b: &AbstractValue) -> Result<AbstractValue, Mismatch> {
    use AbstractValue::*;

    match (a, b) {
        (Bottom, _) => Ok(b.clone()),
        (_, Bottom) => Ok(a.clone()),

        (Bool, Bool | BoolConst(_)) | (BoolConst(_), Bool) => Ok(Bool),
        (BoolConst(x), BoolConst(y)) => Ok(if x == y { BoolConst(*x) } else { Bool }),

        (Int, Int | IntConst(_)) | (IntConst(_), Int) => Ok(Int),
        (IntConst(x), IntConst(y)) => Ok(if x == y { IntConst(*x) } else { Int }),

        (Float, Float) => Ok(Float),

        (Tuple(xs), Tuple(ys)) if xs.len() == ys.len() => Ok(Tuple(join_all(xs, ys)?)),

        (Record(r1, xs), Record(r2, ys)) if r1 == r2 => {
            debug_assert_eq!(xs.len(), ys.len());
            Ok(Record(*r1, join_all(xs, ys)?))
        }

        (Array(x), Array(y)) => Ok(Array(Box::new(join(x, y)?))),
        (List(x), List(y)) => Ok(List(Box::new(join(x, y)?))),

        (Func(f1), Func(f2)) => {
            let mut cases = f1.0.clone();
            cases.extend(f2.0.iter().cloned());
            Ok(Func(FuncRep(cases)))
        }

        (TypeRef(k1), TypeRef(k2)) if k1 == k2 => Ok(TypeRef(*k1)),

        _ => Err(Mismatch {
            left: a.clone(),
            right: b.clone(),
        }),
    }
}

fn join_all(xs: &[AbstractValue], ys: &[AbstractValue]) -> Result<Vec<AbstractValue>, Mismatch> {
    xs.iter().zip(ys).map(|(x, y)| join(x, y)).collect()
}

/// Lifts a concrete entry-point argument to the abstract value inference is
/// seeded with. Scalar literals widen to their kind; container shape is
/// preserved recursively. (Graph and primitive references never pass through
/// here; they arise from constant nodes and stay precise.)
pub fn broaden_value(val: &Value) -> Result<AbstractValue, Mismatch> {
    match val {
        Value::Bool(_) => Ok(AbstractValue::Bool),
        Value::Int(_) => Ok(AbstractValue::Int),
        Value::Float(_) => Ok(AbstractValue::Float),
        Value::Tuple(items) => Ok(AbstractValue::Tuple(
            items.iter().map(broaden_value).collect::<Result<_, _>>()?,
        )),
        Value::Record(record, fields) => Ok(AbstractValue::Record(
            *record,
            fields.iter().map(broaden_value).collect::<Result<_, _>>()?,
        )),
        Value::Array(items) => Ok(AbstractValue::Array(Box::new(broaden_items(items)?))),
        Value::List(items) => Ok(AbstractValue::List(Box::new(broaden_items(items)?))),
    }
}

fn broaden_items(items: &[Value]) -> Result<AbstractValue, Mismatch> {
    let mut elem = AbstractValue::Bottom;
    for item in items {
        elem = join(&elem, &broaden_value(item)?)?;
    }
    Ok(elem)
}

/// Widens exact scalar values to their kinds, recursively through containers.
/// Applied to arguments at every graph call boundary so caches are keyed by
/// shape, not by literal: a callee invoked with `2` and with `3` is one call
/// shape. Function candidates pass through untouched; resolving polymorphism
/// depends on their precision.
pub fn broaden_abstract(val: &AbstractValue) -> AbstractValue {
    use AbstractValue::*;

    match val {
        BoolConst(_) => Bool,
        IntConst(_) => Int,
        Tuple(items) => Tuple(items.iter().map(broaden_abstract).collect()),
        Record(record, fields) => Record(*record, fields.iter().map(broaden_abstract).collect()),
        Array(elem) => Array(Box::new(broaden_abstract(elem))),
        List(elem) => List(Box::new(broaden_abstract(elem))),
        Bottom | Bool | Int | Float | Func(_) | TypeRef(_) => val.clone(),
    }
}

/// Does this value satisfy a `HasType` test against `kind`? `None` when the
/// value is still incomplete.
pub fn matches_kind(val: &AbstractValue, kind: TypeKind) -> Option<bool> {
    use AbstractValue::*;

    let actual = match val {
        Bottom => return None,
        Bool | BoolConst(_) => TypeKind::Bool,
        Int | IntConst(_) => TypeKind::Int,
        Float => TypeKind::Float,
        Tuple(_) => TypeKind::Tuple,
        Record(_, _) => TypeKind::Record,
        Array(_) => TypeKind::Array,
        List(_) => TypeKind::List,
        Func(_) => TypeKind::Func,
        TypeRef(_) => return Some(false),
    };
    Some(actual == kind)
}

/// True if any part of the value is still pending a fixpoint.
pub fn contains_bottom(val: &AbstractValue) -> bool {
    use AbstractValue::*;

    match val {
        Bottom => true,
        Bool | BoolConst(_) | Int | IntConst(_) | Float | TypeRef(_) => false,
        Tuple(items) | Record(_, items) => items.iter().any(contains_bottom),
        Array(elem) | List(elem) => contains_bottom(elem),
        Func(rep) => rep.0.iter().any(case_contains_bottom),
    }
}

fn case_contains_bottom(case: &FuncCase) -> bool {
    match case {
        FuncCase::Graph { .. } | FuncCase::Prim(_) | FuncCase::Ctor(_) => false,
        FuncCase::Partial { func, bound } => {
            case_contains_bottom(func) || bound.iter().any(contains_bottom)
        }
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AbstractValue::*;

        match self {
            Bottom => write!(f, "<pending>"),
            Bool => write!(f, "bool"),
            BoolConst(val) => write!(f, "bool={}", val),
            Int => write!(f, "int"),
            IntConst(val) => write!(f, "int={}", val),
            Float => write!(f, "float"),
            Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Record(record, fields) => {
                write!(f, "record#{}{{", record.0)?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", field)?;
                }
                write!(f, "}}")
            }
            Array(elem) => write!(f, "array[{}]", elem),
            List(elem) => write!(f, "list[{}]", elem),
            Func(rep) => {
                write!(f, "fn{{")?;
                for (i, case) in rep.0.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", case)?;
                }
                write!(f, "}}")
            }
            TypeRef(kind) => write!(f, "type:{:?}", kind),
        }
    }
}

impl fmt::Display for FuncCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuncCase::Graph { graph, .. } => write!(f, "graph#{}", graph.0),
            FuncCase::Prim(intr) => write!(f, "{}", intrinsic_to_name(*intr).debug_name()),
            FuncCase::Ctor(record) => write!(f, "ctor#{}", record.0),
            FuncCase::Partial { func, bound } => {
                write!(f, "partial({}, {} bound)", func, bound.len())
            }
        }
    }
}

pub fn display_argspec(argspec: &[AbstractValue]) -> String {
    let rendered = argspec
        .iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>();
    format!("({})", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_widens_unequal_scalar_constants() {
        let joined = join(
            &AbstractValue::IntConst(1),
            &AbstractValue::IntConst(2),
        )
        .unwrap();
        assert_eq!(joined, AbstractValue::Int);

        let same = join(
            &AbstractValue::BoolConst(true),
            &AbstractValue::BoolConst(true),
        )
        .unwrap();
        assert_eq!(same, AbstractValue::BoolConst(true));
    }

    #[test]
    fn join_rejects_cross_kind_shapes() {
        assert!(join(&AbstractValue::Int, &AbstractValue::Float).is_err());
        assert!(join(
            &AbstractValue::Tuple(vec![AbstractValue::Int]),
            &AbstractValue::Int,
        )
        .is_err());
        assert!(join(
            &AbstractValue::Tuple(vec![AbstractValue::Int]),
            &AbstractValue::Tuple(vec![AbstractValue::Int, AbstractValue::Int]),
        )
        .is_err());
    }

    #[test]
    fn join_is_bottom_unital() {
        let val = AbstractValue::Array(Box::new(AbstractValue::Float));
        assert_eq!(join(&AbstractValue::Bottom, &val).unwrap(), val);
        assert_eq!(join(&val, &AbstractValue::Bottom).unwrap(), val);
    }

    #[test]
    fn broaden_preserves_container_shape() {
        let val = Value::Tuple(vec![
            Value::Int(13),
            Value::Array(vec![Value::Float(2.7), Value::Float(6.91)]),
        ]);
        assert_eq!(
            broaden_value(&val).unwrap(),
            AbstractValue::Tuple(vec![
                AbstractValue::Int,
                AbstractValue::Array(Box::new(AbstractValue::Float)),
            ]),
        );
    }

    #[test]
    fn broaden_rejects_mixed_element_arrays() {
        let val = Value::Array(vec![Value::Int(1), Value::Float(1.0)]);
        assert!(broaden_value(&val).is_err());
    }
}
