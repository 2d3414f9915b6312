//! Concrete evaluator for specialized programs. This is a debug/test surface:
//! it runs validated compiler output, so IR-invariant violations panic rather
//! than propagate.

use im_rc::OrdMap;
use ossify_common::data::graph_ast as graph;
use ossify_common::data::graph_ast::RecordId;
use ossify_common::data::intrinsics::Intrinsic;
use ossify_common::data::mono_ast as mono;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Tuple(Vec<Value>),
    Record(RecordId, Vec<Value>),
    Array(Vec<Value>),
    List(Vec<Value>),
    Func(FuncValue),
    /// Result of evaluating a dead placeholder; reading through it is an IR
    /// invariant violation.
    Opaque,
}

#[derive(Clone, Debug)]
pub enum FuncValue {
    /// A closure: the instance plus the frame chain its captures resolve
    /// against.
    Graph(mono::GraphId, Option<Rc<Frame>>),
    Prim(Intrinsic),
    Ctor(RecordId),
    Partial(Rc<FuncValue>, Vec<Value>),
}

impl Value {
    pub fn from_concrete(val: &graph::Value) -> Value {
        match val {
            graph::Value::Bool(val) => Value::Bool(*val),
            graph::Value::Int(val) => Value::Int(*val),
            graph::Value::Float(val) => Value::Float(*val),
            graph::Value::Tuple(items) => {
                Value::Tuple(items.iter().map(Value::from_concrete).collect())
            }
            graph::Value::Record(record, fields) => {
                Value::Record(*record, fields.iter().map(Value::from_concrete).collect())
            }
            graph::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_concrete).collect())
            }
            graph::Value::List(items) => {
                Value::List(items.iter().map(Value::from_concrete).collect())
            }
        }
    }

    /// Back to a plain data value; `None` for functions and placeholders.
    pub fn to_concrete(&self) -> Option<graph::Value> {
        match self {
            Value::Bool(val) => Some(graph::Value::Bool(*val)),
            Value::Int(val) => Some(graph::Value::Int(*val)),
            Value::Float(val) => Some(graph::Value::Float(*val)),
            Value::Tuple(items) => Some(graph::Value::Tuple(
                items.iter().map(Value::to_concrete).collect::<Option<_>>()?,
            )),
            Value::Record(record, fields) => Some(graph::Value::Record(
                *record,
                fields.iter().map(Value::to_concrete).collect::<Option<_>>()?,
            )),
            Value::Array(items) => Some(graph::Value::Array(
                items.iter().map(Value::to_concrete).collect::<Option<_>>()?,
            )),
            Value::List(items) => Some(graph::Value::List(
                items.iter().map(Value::to_concrete).collect::<Option<_>>()?,
            )),
            Value::Func(_) | Value::Opaque => None,
        }
    }
}

/// One call frame. Node values are memoized per frame; closures hold the
/// frame chain alive, so captures are read on demand even after the
/// capturing call returned.
#[derive(Debug)]
pub struct Frame {
    graph: mono::GraphId,
    args: Vec<Value>,
    parent: Option<Rc<Frame>>,
    memo: RefCell<OrdMap<mono::NodeId, Value>>,
}

impl Frame {
    fn new(graph: mono::GraphId, args: Vec<Value>, parent: Option<Rc<Frame>>) -> Rc<Frame> {
        Rc::new(Frame {
            graph,
            args,
            parent,
            memo: RefCell::new(OrdMap::new()),
        })
    }
}

pub fn evaluate(program: &mono::Program, args: &[graph::Value]) -> Value {
    let entry = &program.graphs[program.entry];
    assert_eq!(args.len(), entry.params.len());

    let frame = Frame::new(
        program.entry,
        args.iter().map(Value::from_concrete).collect(),
        None,
    );
    eval_node(program, &frame, entry.ret)
}

fn eval_node(program: &mono::Program, frame: &Rc<Frame>, node: mono::NodeId) -> Value {
    let frame = match program.node_owner(node) {
        None => frame.clone(),
        Some(owner) if owner == frame.graph => frame.clone(),
        Some(owner) => {
            let mut cursor = frame.parent.clone();
            loop {
                match cursor {
                    Some(ancestor) if ancestor.graph == owner => break ancestor,
                    Some(ancestor) => cursor = ancestor.parent.clone(),
                    None => unreachable!("capture read outside its frame chain"),
                }
            }
        }
    };

    if let Some(val) = frame.memo.borrow().get(&node) {
        return val.clone();
    }

    let val = stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
        eval_node_inner(program, &frame, node)
    });
    frame.memo.borrow_mut().insert(node, val.clone());
    val
}

fn eval_node_inner(program: &mono::Program, frame: &Rc<Frame>, node: mono::NodeId) -> Value {
    match &program.nodes[node] {
        mono::Node::Const(val) => match val {
            mono::Const::Bool(val) => Value::Bool(*val),
            mono::Const::Int(val) => Value::Int(*val),
            mono::Const::Float(val) => Value::Float(val.to_f64()),
            mono::Const::Prim(intr) => Value::Func(FuncValue::Prim(*intr)),
            mono::Const::Ctor(record) => Value::Func(FuncValue::Ctor(*record)),
            mono::Const::Opaque => Value::Opaque,
            mono::Const::Graph(target) => {
                let capture = match program.graphs[*target].parent {
                    None => None,
                    Some(parent) => {
                        let mut cursor = Some(frame.clone());
                        loop {
                            match cursor {
                                Some(ancestor) if ancestor.graph == parent => {
                                    break Some(ancestor)
                                }
                                Some(ancestor) => cursor = ancestor.parent.clone(),
                                None => unreachable!("closure created outside its parent frame"),
                            }
                        }
                    }
                };
                Value::Func(FuncValue::Graph(*target, capture))
            }
        },

        mono::Node::Param { index, .. } => frame.args[*index].clone(),

        mono::Node::App { func, args, .. } => {
            let func_val = match eval_node(program, frame, *func) {
                Value::Func(func_val) => func_val,
                other => panic!("applied non-function value {:?}", other),
            };
            let arg_vals = args
                .iter()
                .map(|&arg| eval_node(program, frame, arg))
                .collect();
            apply(program, &func_val, arg_vals)
        }
    }
}

fn apply(program: &mono::Program, func: &FuncValue, args: Vec<Value>) -> Value {
    match func {
        FuncValue::Graph(target, capture) => {
            let def = &program.graphs[*target];
            assert_eq!(args.len(), def.params.len());
            let frame = Frame::new(*target, args, capture.clone());
            eval_node(program, &frame, def.ret)
        }

        FuncValue::Prim(intr) => apply_prim(program, *intr, args),

        FuncValue::Ctor(record) => Value::Record(*record, args),

        FuncValue::Partial(inner, bound) => {
            let mut full = bound.clone();
            full.extend(args);
            apply(program, inner, full)
        }
    }
}

fn apply_prim(program: &mono::Program, intr: Intrinsic, mut args: Vec<Value>) -> Value {
    match intr {
        Intrinsic::Add => num_binop(args, |a, b| a + b, |a, b| a + b),
        Intrinsic::Sub => num_binop(args, |a, b| a - b, |a, b| a - b),
        Intrinsic::Mul => num_binop(args, |a, b| a * b, |a, b| a * b),
        Intrinsic::Div => num_binop(args, |a, b| a / b, |a, b| a / b),

        Intrinsic::Neg => match args.pop() {
            Some(Value::Int(val)) if args.is_empty() => Value::Int(-val),
            Some(Value::Float(val)) if args.is_empty() => Value::Float(-val),
            other => panic!("neg applied to {:?}", other),
        },
        Intrinsic::Pos => match args.pop() {
            Some(val @ (Value::Int(_) | Value::Float(_))) if args.is_empty() => val,
            other => panic!("pos applied to {:?}", other),
        },

        Intrinsic::Eq => cmp_op(args, |ord| ord == std::cmp::Ordering::Equal),
        Intrinsic::Ne => cmp_op(args, |ord| ord != std::cmp::Ordering::Equal),
        Intrinsic::Lt => cmp_op(args, |ord| ord == std::cmp::Ordering::Less),
        Intrinsic::Lte => cmp_op(args, |ord| ord != std::cmp::Ordering::Greater),
        Intrinsic::Gt => cmp_op(args, |ord| ord == std::cmp::Ordering::Greater),
        Intrinsic::Gte => cmp_op(args, |ord| ord != std::cmp::Ordering::Less),

        Intrinsic::Not => match args.pop() {
            Some(Value::Bool(val)) if args.is_empty() => Value::Bool(!val),
            other => panic!("not applied to {:?}", other),
        },

        Intrinsic::Switch => {
            let [cond, on_true, on_false]: [Value; 3] =
                args.try_into().unwrap_or_else(|_| panic!("switch arity"));
            match cond {
                Value::Bool(true) => on_true,
                Value::Bool(false) => on_false,
                other => panic!("switch on non-boolean {:?}", other),
            }
        }

        Intrinsic::Partial => {
            assert!(!args.is_empty());
            let bound = args.split_off(1);
            match args.into_iter().next() {
                Some(Value::Func(func)) => Value::Func(FuncValue::Partial(Rc::new(func), bound)),
                other => panic!("partial of non-function {:?}", other),
            }
        }

        Intrinsic::TupleNew => Value::Tuple(args),

        Intrinsic::TupleGet => {
            let [tuple, index]: [Value; 2] =
                args.try_into().unwrap_or_else(|_| panic!("tuple_get arity"));
            match (tuple, index) {
                (Value::Tuple(items), Value::Int(i)) => items[i as usize].clone(),
                other => panic!("tuple_get applied to {:?}", other),
            }
        }

        Intrinsic::FieldGet => {
            let [record, index]: [Value; 2] =
                args.try_into().unwrap_or_else(|_| panic!("field_get arity"));
            match (record, index) {
                (Value::Record(_, fields), Value::Int(i)) => fields[i as usize].clone(),
                other => panic!("field_get applied to {:?}", other),
            }
        }

        Intrinsic::ArrayMap => {
            let [func, array]: [Value; 2] =
                args.try_into().unwrap_or_else(|_| panic!("array_map arity"));
            match (func, array) {
                (Value::Func(func), Value::Array(items)) => Value::Array(
                    items
                        .into_iter()
                        .map(|item| apply(program, &func, vec![item]))
                        .collect(),
                ),
                other => panic!("array_map applied to {:?}", other),
            }
        }

        Intrinsic::ListMap => {
            let [func, list]: [Value; 2] =
                args.try_into().unwrap_or_else(|_| panic!("list_map arity"));
            match (func, list) {
                (Value::Func(func), Value::List(items)) => Value::List(
                    items
                        .into_iter()
                        .map(|item| apply(program, &func, vec![item]))
                        .collect(),
                ),
                other => panic!("list_map applied to {:?}", other),
            }
        }

        Intrinsic::HasType => unreachable!("hastype is folded away during specialization"),
    }
}

fn num_binop(args: Vec<Value>, int_op: impl Fn(i64, i64) -> i64, float_op: impl Fn(f64, f64) -> f64) -> Value {
    let [a, b]: [Value; 2] = match args.try_into() {
        Ok(pair) => pair,
        Err(args) => panic!("arithmetic arity: {:?}", args),
    };
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Value::Int(int_op(a, b)),
        (Value::Float(a), Value::Float(b)) => Value::Float(float_op(a, b)),
        // Mixed operands promote to float, matching inference.
        (Value::Int(a), Value::Float(b)) => Value::Float(float_op(a as f64, b)),
        (Value::Float(a), Value::Int(b)) => Value::Float(float_op(a, b as f64)),
        other => panic!("arithmetic applied to {:?}", other),
    }
}

fn cmp_op(args: Vec<Value>, accept: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    let [a, b]: [Value; 2] = match args.try_into() {
        Ok(pair) => pair,
        Err(args) => panic!("comparison arity: {:?}", args),
    };
    let ord = match (a, b) {
        (Value::Int(a), Value::Int(b)) => a.cmp(&b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(&b),
        (Value::Float(a), Value::Float(b)) => {
            a.partial_cmp(&b).unwrap_or_else(|| panic!("NaN comparison"))
        }
        (Value::Int(a), Value::Float(b)) => (a as f64)
            .partial_cmp(&b)
            .unwrap_or_else(|| panic!("NaN comparison")),
        (Value::Float(a), Value::Int(b)) => a
            .partial_cmp(&(b as f64))
            .unwrap_or_else(|| panic!("NaN comparison")),
        other => panic!("comparison applied to {:?}", other),
    };
    Value::Bool(accept(ord))
}
