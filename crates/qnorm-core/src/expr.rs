//! # Query Expression Tree
//!
//! This module defines the immutable AST that the rewriter consumes and produces. A node is one
//! of four variants:
//!
//! ## Method Calls (`MethodCall`)
//! A call to a generically-typed query operator such as `Where`, `DefaultIfEmpty` or
//! `FirstOrDefault`. The operator and its arity must name a registered overload (see
//! [`crate::signature`]); the builders in this module check that on construction.
//!
//! ## Binary Operations (`BinaryExpr`)
//! Null-coalescing, equality, comparison, boolean and arithmetic operators.
//!
//! ## Constants (`Constant`)
//! A literal [`Value`] with its static type. A constant holding `Value::Null` is the null
//! literal.
//!
//! ## Opaque Nodes (`OpaqueExpr`)
//! Everything else: sequence sources, lambda parameters and bodies, field access, array
//! construction, negation. Rewriters treat these as transparent and only descend into their
//! children.
//!
//! ## Sharing
//!
//! Children are held in `Arc`, so a rewritten tree shares every unchanged subtree with its
//! input. Nodes are never mutated after construction.

use crate::error::Result;
use crate::signature;
use crate::types::{DataType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Query operators that can appear as the target of a method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOperator {
    Where,
    Select,
    DefaultIfEmpty,
    FirstOrDefault,
    First,
    Concat,
    Count,
    Any,
    /// Canonical helper: first element of the source, or the supplied fallback when the
    /// (optionally filtered) source is empty.
    FirstOrFallback,
}

impl QueryOperator {
    pub fn name(&self) -> &'static str {
        match self {
            QueryOperator::Where => "Where",
            QueryOperator::Select => "Select",
            QueryOperator::DefaultIfEmpty => "DefaultIfEmpty",
            QueryOperator::FirstOrDefault => "FirstOrDefault",
            QueryOperator::First => "First",
            QueryOperator::Concat => "Concat",
            QueryOperator::Count => "Count",
            QueryOperator::Any => "Any",
            QueryOperator::FirstOrFallback => "FirstOrFallback",
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Null-coalescing (`left ?? right`).
    Coalesce,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    Add,
    Subtract,
    Multiply,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Coalesce => "??",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
        }
    }
}

/// Kinds of opaque nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpaqueKind {
    /// A named root sequence supplied by the query host. Leaf.
    Source { name: String },
    /// A lambda parameter reference. Leaf.
    Parameter { name: String },
    /// A lambda; the single child is the body.
    Lambda { params: Vec<String> },
    /// Field access; the single child is the target.
    Field { name: String },
    /// Array construction from the children, in order.
    NewArray,
    /// Boolean negation of the single child.
    Not,
}

/// A call to a query operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodCall {
    pub operator: QueryOperator,
    pub type_args: Vec<DataType>,
    pub args: Vec<Arc<Expr>>,
    pub ty: DataType,
}

impl MethodCall {
    /// Element type the operator works over: the first generic argument when present,
    /// otherwise the element type of the first argument's sequence type.
    pub fn element_type(&self) -> Option<&DataType> {
        self.type_args
            .first()
            .or_else(|| self.args.first().and_then(|a| a.static_type().element_type()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Arc<Expr>,
    pub right: Arc<Expr>,
    pub ty: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
    pub value: Value,
    pub ty: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpaqueExpr {
    pub kind: OpaqueKind,
    pub children: Vec<Arc<Expr>>,
    pub ty: DataType,
}

/// A node of the query expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    MethodCall(MethodCall),
    Binary(BinaryExpr),
    Constant(Constant),
    Opaque(OpaqueExpr),
}

impl Expr {
    /// The type this node evaluates to.
    pub fn static_type(&self) -> &DataType {
        match self {
            Expr::MethodCall(c) => &c.ty,
            Expr::Binary(b) => &b.ty,
            Expr::Constant(c) => &c.ty,
            Expr::Opaque(o) => &o.ty,
        }
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&Arc<Expr>> {
        match self {
            Expr::MethodCall(c) => c.args.iter().collect(),
            Expr::Binary(b) => vec![&b.left, &b.right],
            Expr::Constant(_) => vec![],
            Expr::Opaque(o) => o.children.iter().collect(),
        }
    }

    /// The literal value if this node is a constant.
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expr::Constant(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Constant(c) if c.value.is_null())
    }

    /// Number of nodes in the tree rooted here.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Build a method call, checking that the operator has an overload of this arity.
    pub fn call(
        operator: QueryOperator,
        type_args: Vec<DataType>,
        args: Vec<Arc<Expr>>,
        ty: DataType,
    ) -> Result<Arc<Expr>> {
        signature::resolve(operator, args.len())?;
        Ok(Arc::new(Expr::MethodCall(MethodCall {
            operator,
            type_args,
            args,
            ty,
        })))
    }

    pub fn binary(op: BinaryOp, left: Arc<Expr>, right: Arc<Expr>, ty: DataType) -> Arc<Expr> {
        Arc::new(Expr::Binary(BinaryExpr {
            op,
            left,
            right,
            ty,
        }))
    }

    pub fn constant(value: Value, ty: DataType) -> Arc<Expr> {
        Arc::new(Expr::Constant(Constant { value, ty }))
    }

    /// The null literal, typed as `ty`.
    pub fn null(ty: DataType) -> Arc<Expr> {
        Self::constant(Value::Null, ty)
    }

    pub fn opaque(kind: OpaqueKind, children: Vec<Arc<Expr>>, ty: DataType) -> Arc<Expr> {
        Arc::new(Expr::Opaque(OpaqueExpr { kind, children, ty }))
    }

    pub fn source(name: impl Into<String>, ty: DataType) -> Arc<Expr> {
        Self::opaque(OpaqueKind::Source { name: name.into() }, vec![], ty)
    }

    pub fn parameter(name: impl Into<String>, ty: DataType) -> Arc<Expr> {
        Self::opaque(OpaqueKind::Parameter { name: name.into() }, vec![], ty)
    }

    pub fn lambda(params: Vec<String>, body: Arc<Expr>, ty: DataType) -> Arc<Expr> {
        Self::opaque(OpaqueKind::Lambda { params }, vec![body], ty)
    }

    pub fn field(target: Arc<Expr>, name: impl Into<String>, ty: DataType) -> Arc<Expr> {
        Self::opaque(OpaqueKind::Field { name: name.into() }, vec![target], ty)
    }

    pub fn new_array(elements: Vec<Arc<Expr>>, ty: DataType) -> Arc<Expr> {
        Self::opaque(OpaqueKind::NewArray, elements, ty)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::MethodCall(c) => {
                write!(f, "{}", c.operator)?;
                if !c.type_args.is_empty() {
                    write!(f, "<")?;
                    for (i, t) in c.type_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", t)?;
                    }
                    write!(f, ">")?;
                }
                write!(f, "(")?;
                write_list(f, &c.args)?;
                write!(f, ")")
            }
            Expr::Binary(b) => write!(f, "({} {} {})", b.left, b.op.symbol(), b.right),
            Expr::Constant(c) => write!(f, "{}", c.value),
            Expr::Opaque(o) => match &o.kind {
                OpaqueKind::Source { name } => write!(f, "${}", name),
                OpaqueKind::Parameter { name } => write!(f, "{}", name),
                OpaqueKind::Lambda { params } => {
                    write!(f, "|{}| ", params.join(", "))?;
                    write_list(f, &o.children)
                }
                OpaqueKind::Field { name } => {
                    write_list(f, &o.children)?;
                    write!(f, ".{}", name)
                }
                OpaqueKind::NewArray => {
                    write!(f, "[")?;
                    write_list(f, &o.children)?;
                    write!(f, "]")
                }
                OpaqueKind::Not => {
                    write!(f, "!")?;
                    write_list(f, &o.children)
                }
            },
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Arc<Expr>]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", e)?;
    }
    Ok(())
}
