//! # Static Types and Constant Values
//!
//! Every node of a query expression tree carries a [`DataType`] describing the value it
//! evaluates to. Constants carry a [`Value`]. Both are small: the rewriter only
//! needs enough of a type system to answer the capability queries in
//! [`crate::capability`] and to synthesize default instances.
//!
//! ## Absence vs. Empty Wrappers
//!
//! `Value::Null` is the raw absence sentinel. An optional-wrapper value (`Value::Wrapped`) is
//! always a concrete value, even when it represents "no payload". The two compare unequal under
//! structural equality, which is exactly the mismatch the optional-comparison rule removes.
//!
//! The empty wrapper is modelled as a wrapper around `default(T)`. A wrapper that holds a
//! present `default(T)` is therefore the same value: `Nullable(0)` is both "empty" and "holds
//! 0", and equality cannot tell them apart.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Static type of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int64,
    Float64,
    Utf8,
    /// A named record (struct/class) type whose shape lives in the type registry.
    Record(String),
    /// An optional-wrapper of `inner`. `wrapper` names the registered wrapper family
    /// (e.g. `Nullable`).
    Optional {
        wrapper: String,
        inner: Box<DataType>,
    },
    /// A sequence of elements.
    Sequence(Box<DataType>),
    /// A lambda type (predicates and selectors).
    Function {
        params: Vec<DataType>,
        ret: Box<DataType>,
    },
}

impl DataType {
    pub fn record(name: impl Into<String>) -> Self {
        DataType::Record(name.into())
    }

    pub fn optional(wrapper: impl Into<String>, inner: DataType) -> Self {
        DataType::Optional {
            wrapper: wrapper.into(),
            inner: Box::new(inner),
        }
    }

    pub fn sequence(elem: DataType) -> Self {
        DataType::Sequence(Box::new(elem))
    }

    pub fn function(params: Vec<DataType>, ret: DataType) -> Self {
        DataType::Function {
            params,
            ret: Box::new(ret),
        }
    }

    /// Element type if this is a sequence type.
    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Sequence(elem) => Some(elem),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "bool"),
            DataType::Int64 => write!(f, "i64"),
            DataType::Float64 => write!(f, "f64"),
            DataType::Utf8 => write!(f, "string"),
            DataType::Record(name) => write!(f, "{}", name),
            DataType::Optional { wrapper, inner } => write!(f, "{}<{}>", wrapper, inner),
            DataType::Sequence(elem) => write!(f, "Seq<{}>", elem),
            DataType::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}

/// Constant value carried by `Constant` nodes and produced by default synthesis.
///
/// Uses `OrderedFloat` for `f64` so that values derive `Eq` and `Hash`, which makes
/// structural equality of whole trees well defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// The null/absent sentinel.
    Null,
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
    /// A record instance; fields are kept in declaration order.
    Record {
        type_name: String,
        fields: Vec<(String, Value)>,
    },
    /// An optional-wrapper instance built through the wrapper's constructor.
    Wrapped {
        wrapper: String,
        payload: Box<Value>,
    },
    Sequence(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up a record field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record { fields, .. } => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Utf8(v) => write!(f, "{:?}", v),
            Value::Record { type_name, fields } => {
                write!(f, "{} {{", type_name)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                write!(f, " }}")
            }
            Value::Wrapped { wrapper, payload } => write!(f, "{}({})", wrapper, payload),
            Value::Sequence(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
        }
    }
}
