use crate::data::intrinsics::{Intrinsic, Name};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

// Names:

macro_rules! define_intrinsic_to_name {
    ($(($intrinsic : ident, $name : expr)),*) => {
        pub fn intrinsic_to_name(intr: Intrinsic) -> Name {
            match intr {
                $(Intrinsic::$intrinsic => $name),*
            }
        }
    };
}

macro_rules! define_intrinsic_names_const {
    ($(($intrinsic : ident, $name : expr)),*) => {
        pub const INTRINSIC_NAMES: &[(Intrinsic, Name)] = &[
            $((Intrinsic::$intrinsic, $name)),*
        ];
    }
}

// Watch out!  This macro expects a trailing comma, but the macros it invokes internally do not.
macro_rules! define_intrinsic_names {
    ($(($intrinsic : ident, $name : expr)),*,) => {
        define_intrinsic_to_name!($(($intrinsic, $name)),*);
        define_intrinsic_names_const!($(($intrinsic, $name)),*);
    };
}

const fn op_name(debug_name: &'static str) -> Name {
    Name::Op { debug_name }
}

const fn name(source_name: &'static str) -> Name {
    Name::Func { source_name }
}

define_intrinsic_names![
    // Scalar ops
    // These names double as the source-level spellings the parser resolves
    (Add, op_name("add")),
    (Sub, op_name("sub")),
    (Mul, op_name("mul")),
    (Div, op_name("div")),
    (Neg, op_name("neg")),
    (Pos, op_name("pos")),
    (Eq, op_name("eq")),
    (Ne, op_name("ne")),
    (Lt, op_name("lt")),
    (Lte, op_name("lte")),
    (Gt, op_name("gt")),
    (Gte, op_name("gte")),
    (Not, op_name("not")),
    // Control and staging ops
    (Switch, name("switch")),
    (Partial, name("partial")),
    (HasType, name("hastype")),
    // Structural ops
    (TupleNew, name("tuple_new")),
    (TupleGet, name("tuple_get")),
    (FieldGet, name("field_get")),
    // Higher-order aggregate ops
    (ArrayMap, name("array_map")),
    (ListMap, name("list_map")),
];

static INTRINSICS_BY_NAME: Lazy<BTreeMap<&'static str, Intrinsic>> = Lazy::new(|| {
    INTRINSIC_NAMES
        .iter()
        .map(|(intr, name)| (name.debug_name(), *intr))
        .collect()
});

pub fn intrinsic_by_name(name: &str) -> Option<Intrinsic> {
    INTRINSICS_BY_NAME.get(name).copied()
}

/// Classification of the scalar intrinsics' abstract transfer behavior.
/// Structural and higher-order intrinsics are handled case-by-case in the
/// inference engine and have no entry here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarSig {
    /// Numeric in, numeric out; mixed int/float operands promote to float.
    Arith { arity: usize },
    /// Numeric in, boolean out.
    Compare,
    /// Boolean in, boolean out.
    Logic { arity: usize },
}

pub fn scalar_sig(intr: Intrinsic) -> Option<ScalarSig> {
    match intr {
        Intrinsic::Add | Intrinsic::Sub | Intrinsic::Mul | Intrinsic::Div => {
            Some(ScalarSig::Arith { arity: 2 })
        }
        Intrinsic::Neg | Intrinsic::Pos => Some(ScalarSig::Arith { arity: 1 }),
        Intrinsic::Eq
        | Intrinsic::Ne
        | Intrinsic::Lt
        | Intrinsic::Lte
        | Intrinsic::Gt
        | Intrinsic::Gte => Some(ScalarSig::Compare),
        Intrinsic::Not => Some(ScalarSig::Logic { arity: 1 }),
        _ => None,
    }
}
