//! Shared fixtures for the integration tests: a type registry, tree builders and a small
//! reference evaluator with in-memory sequence semantics.
//!
//! The evaluator mirrors the in-memory side of the mismatch: single-argument
//! `DefaultIfEmpty` yields `[null]` on an empty sequence, `FirstOrDefault` yields `null`, and
//! equality is structural.

#![allow(dead_code)]

use ordered_float::OrderedFloat;
use qnorm_core::capability::{Constructor, RecordDef, TypeRegistry};
use qnorm_core::expr::{BinaryOp, Expr, OpaqueKind, QueryOperator};
use qnorm_core::signature::expand_first_or_fallback;
use qnorm_core::types::{DataType, Value};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub fn nullable(inner: DataType) -> DataType {
    DataType::optional("Nullable", inner)
}

pub fn order_ty() -> DataType {
    DataType::record("Order")
}

/// `Point` has no zero-argument constructor.
pub fn point_ty() -> DataType {
    DataType::record("Point")
}

pub fn registry() -> Arc<TypeRegistry> {
    let mut r = TypeRegistry::standard();
    r.register_record(
        "Order",
        RecordDef::new()
            .field("id", DataType::Int64)
            .field("total", DataType::Float64)
            .field("note", DataType::Utf8)
            .field("alt", DataType::Utf8)
            .field("discount", nullable(DataType::Int64))
            .field("location", nullable(point_ty()))
            .constructor(Constructor::nullary()),
    );
    r.register_record(
        "Point",
        RecordDef::new()
            .field("x", DataType::Float64)
            .field("tag", DataType::Utf8)
            .constructor(Constructor::with_params(vec![DataType::Float64])),
    );
    Arc::new(r)
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// An `Order` row; a missing discount is the empty wrapper, as in a zeroed record.
pub fn order(id: i64, note: &str, discount: Option<i64>) -> Value {
    Value::Record {
        type_name: "Order".into(),
        fields: vec![
            ("id".into(), Value::Int64(id)),
            ("total".into(), Value::Float64(OrderedFloat(id as f64 * 10.0))),
            ("note".into(), Value::Utf8(note.into())),
            ("alt".into(), Value::Utf8(String::new())),
            ("discount".into(), wrapped(Value::Int64(discount.unwrap_or(0)))),
            ("location".into(), wrapped(Value::Null)),
        ],
    }
}

pub fn wrapped(payload: Value) -> Value {
    Value::Wrapped {
        wrapper: "Nullable".into(),
        payload: Box::new(payload),
    }
}

pub fn int(v: i64) -> Value {
    Value::Int64(v)
}

pub fn utf8(v: &str) -> Value {
    Value::Utf8(v.into())
}

// ---------------------------------------------------------------------------
// Tree builders
// ---------------------------------------------------------------------------

pub fn orders() -> Arc<Expr> {
    Expr::source("orders", DataType::sequence(order_ty()))
}

pub fn points() -> Arc<Expr> {
    Expr::source("points", DataType::sequence(point_ty()))
}

pub fn lit(value: Value, ty: DataType) -> Arc<Expr> {
    Expr::constant(value, ty)
}

pub fn param(name: &str, ty: DataType) -> Arc<Expr> {
    Expr::parameter(name, ty)
}

pub fn field(target: &Arc<Expr>, name: &str, ty: DataType) -> Arc<Expr> {
    Expr::field(target.clone(), name, ty)
}

pub fn binary(op: BinaryOp, left: Arc<Expr>, right: Arc<Expr>, ty: DataType) -> Arc<Expr> {
    Expr::binary(op, left, right, ty)
}

pub fn coalesce(left: Arc<Expr>, right: Arc<Expr>, ty: DataType) -> Arc<Expr> {
    Expr::binary(BinaryOp::Coalesce, left, right, ty)
}

pub fn eq(left: Arc<Expr>, right: Arc<Expr>) -> Arc<Expr> {
    Expr::binary(BinaryOp::Equal, left, right, DataType::Bool)
}

/// `|name| body` over one element of type `elem`.
pub fn lambda(name: &str, elem: DataType, body: Arc<Expr>) -> Arc<Expr> {
    let ret = body.static_type().clone();
    Expr::lambda(vec![name.into()], body, DataType::function(vec![elem], ret))
}

pub fn call(op: QueryOperator, elem: DataType, args: Vec<Arc<Expr>>, ty: DataType) -> Arc<Expr> {
    Expr::call(op, vec![elem], args, ty).expect("valid overload")
}

pub fn default_if_empty(source: Arc<Expr>, elem: DataType) -> Arc<Expr> {
    let ty = DataType::sequence(elem.clone());
    call(QueryOperator::DefaultIfEmpty, elem, vec![source], ty)
}

pub fn first_or_default(source: Arc<Expr>, elem: DataType) -> Arc<Expr> {
    call(QueryOperator::FirstOrDefault, elem.clone(), vec![source], elem)
}

pub fn first_or_default_where(source: Arc<Expr>, pred: Arc<Expr>, elem: DataType) -> Arc<Expr> {
    call(QueryOperator::FirstOrDefault, elem.clone(), vec![source, pred], elem)
}

pub fn filter(source: Arc<Expr>, pred: Arc<Expr>, elem: DataType) -> Arc<Expr> {
    let ty = DataType::sequence(elem.clone());
    call(QueryOperator::Where, elem, vec![source, pred], ty)
}

// ---------------------------------------------------------------------------
// Reference evaluator
// ---------------------------------------------------------------------------

/// Bindings for sources and lambda parameters.
#[derive(Debug, Clone, Default)]
pub struct Env {
    sources: HashMap<String, Vec<Value>>,
    params: Vec<(String, Value)>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, name: &str, rows: Vec<Value>) -> Self {
        self.sources.insert(name.into(), rows);
        self
    }

    pub fn bind(mut self, name: &str, value: Value) -> Self {
        self.params.push((name.into(), value));
        self
    }

    fn lookup(&self, name: &str) -> Value {
        self.params
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("unbound parameter {name}"))
    }
}

pub fn eval(expr: &Arc<Expr>, env: &Env) -> Value {
    match expr.as_ref() {
        Expr::Constant(c) => c.value.clone(),
        Expr::Opaque(o) => match &o.kind {
            OpaqueKind::Source { name } => Value::Sequence(
                env.sources
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| panic!("unknown source {name}")),
            ),
            OpaqueKind::Parameter { name } => env.lookup(name),
            OpaqueKind::Field { name } => match eval(&o.children[0], env) {
                Value::Null => Value::Null,
                target => target
                    .field(name)
                    .cloned()
                    .unwrap_or_else(|| panic!("no field {name}")),
            },
            OpaqueKind::NewArray => {
                Value::Sequence(o.children.iter().map(|c| eval(c, env)).collect())
            }
            OpaqueKind::Not => Value::Bool(!truthy(&eval(&o.children[0], env))),
            OpaqueKind::Lambda { .. } => panic!("lambda evaluated outside an operator"),
        },
        Expr::Binary(b) => eval_binary(b.op, &b.left, &b.right, env),
        Expr::MethodCall(call) => {
            let args = &call.args;
            match (call.operator, args.len()) {
                (QueryOperator::Where, 2) => Value::Sequence(
                    rows(&eval(&args[0], env))
                        .into_iter()
                        .filter(|row| truthy(&apply(&args[1], row.clone(), env)))
                        .collect(),
                ),
                (QueryOperator::Select, 2) => Value::Sequence(
                    rows(&eval(&args[0], env))
                        .into_iter()
                        .map(|row| apply(&args[1], row, env))
                        .collect(),
                ),
                (QueryOperator::DefaultIfEmpty, n) => {
                    let items = rows(&eval(&args[0], env));
                    if items.is_empty() {
                        let fallback = if n == 2 { eval(&args[1], env) } else { Value::Null };
                        Value::Sequence(vec![fallback])
                    } else {
                        Value::Sequence(items)
                    }
                }
                (QueryOperator::FirstOrDefault, _) => {
                    filtered(call.args.as_slice(), env).into_iter().next().unwrap_or(Value::Null)
                }
                (QueryOperator::First, _) => filtered(call.args.as_slice(), env)
                    .into_iter()
                    .next()
                    .expect("First on an empty sequence"),
                (QueryOperator::Concat, 2) => {
                    let mut items = rows(&eval(&args[0], env));
                    items.extend(rows(&eval(&args[1], env)));
                    Value::Sequence(items)
                }
                (QueryOperator::Count, _) => Value::Int64(filtered(args, env).len() as i64),
                (QueryOperator::Any, _) => Value::Bool(!filtered(args, env).is_empty()),
                (QueryOperator::FirstOrFallback, _) => {
                    let expanded = expand_first_or_fallback(call).expect("helper expands");
                    eval(&expanded, env)
                }
                (op, n) => panic!("unsupported call {op}/{n}"),
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: &Arc<Expr>, right: &Arc<Expr>, env: &Env) -> Value {
    match op {
        BinaryOp::Coalesce => match eval(left, env) {
            Value::Null => eval(right, env),
            v => v,
        },
        BinaryOp::AndAlso => {
            Value::Bool(truthy(&eval(left, env)) && truthy(&eval(right, env)))
        }
        BinaryOp::OrElse => Value::Bool(truthy(&eval(left, env)) || truthy(&eval(right, env))),
        BinaryOp::Equal => Value::Bool(eval(left, env) == eval(right, env)),
        BinaryOp::NotEqual => Value::Bool(eval(left, env) != eval(right, env)),
        _ => {
            let (Value::Int64(l), Value::Int64(r)) = (eval(left, env), eval(right, env)) else {
                return Value::Null;
            };
            match op {
                BinaryOp::LessThan => Value::Bool(l < r),
                BinaryOp::LessThanOrEqual => Value::Bool(l <= r),
                BinaryOp::GreaterThan => Value::Bool(l > r),
                BinaryOp::GreaterThanOrEqual => Value::Bool(l >= r),
                BinaryOp::Add => Value::Int64(l + r),
                BinaryOp::Subtract => Value::Int64(l - r),
                BinaryOp::Multiply => Value::Int64(l * r),
                _ => unreachable!(),
            }
        }
    }
}

/// Rows of `args[0]`, filtered by `args[1]` when present.
fn filtered(args: &[Arc<Expr>], env: &Env) -> Vec<Value> {
    let items = rows(&eval(&args[0], env));
    match args.get(1) {
        Some(pred) => items
            .into_iter()
            .filter(|row| truthy(&apply(pred, row.clone(), env)))
            .collect(),
        None => items,
    }
}

fn apply(lambda: &Arc<Expr>, arg: Value, env: &Env) -> Value {
    let Expr::Opaque(o) = lambda.as_ref() else {
        panic!("expected lambda, got {lambda}");
    };
    let OpaqueKind::Lambda { params } = &o.kind else {
        panic!("expected lambda, got {lambda}");
    };
    let scope = env.clone().bind(&params[0], arg);
    eval(&o.children[0], &scope)
}

fn rows(v: &Value) -> Vec<Value> {
    match v {
        Value::Sequence(items) => items.clone(),
        other => panic!("expected a sequence, got {other}"),
    }
}

fn truthy(v: &Value) -> bool {
    matches!(v, Value::Bool(true))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
