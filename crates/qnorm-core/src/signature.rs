//! # Operator Signatures
//!
//! Every method call in a query expression tree names an operator and passes some number of
//! arguments. This module holds the canonical overload table keyed by `(operator, arity)`,
//! describing the role of each parameter. Rewriters use it to check that the overload they
//! are about to emit exists; tree builders use it to reject malformed calls.
//!
//! The table is built lazily on first use and is read-only afterwards, so concurrent rewrites
//! share it without synchronization.
//!
//! ## The `FirstOrFallback` Helper
//!
//! `FirstOrFallback` has no evaluator of its own. It is defined by its expansion:
//!
//! ```text
//! FirstOrFallback(source, fallback)            = First(Concat(source, [fallback]))
//! FirstOrFallback(source, predicate, fallback) = First(Concat(Where(source, predicate), [fallback]))
//! ```
//!
//! The fallback is appended after filtering, so it is never tested against the predicate.

use crate::error::{Result, RewriteError};
use crate::expr::{Expr, MethodCall, QueryOperator};
use crate::types::DataType;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Role of one parameter in an overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// An input sequence.
    Source,
    /// A boolean lambda over the element type.
    Predicate,
    /// A projection lambda.
    Selector,
    /// An explicit element-typed fallback value.
    Fallback,
}

/// One overload of a query operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSignature {
    pub operator: QueryOperator,
    pub params: &'static [ParamKind],
}

impl OperatorSignature {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

use ParamKind::*;

const fn sig(operator: QueryOperator, params: &'static [ParamKind]) -> OperatorSignature {
    OperatorSignature { operator, params }
}

const SIGNATURES: &[OperatorSignature] = &[
    sig(QueryOperator::Where, &[Source, Predicate]),
    sig(QueryOperator::Select, &[Source, Selector]),
    sig(QueryOperator::DefaultIfEmpty, &[Source]),
    sig(QueryOperator::DefaultIfEmpty, &[Source, Fallback]),
    sig(QueryOperator::FirstOrDefault, &[Source]),
    sig(QueryOperator::FirstOrDefault, &[Source, Predicate]),
    sig(QueryOperator::First, &[Source]),
    sig(QueryOperator::First, &[Source, Predicate]),
    sig(QueryOperator::Concat, &[Source, Source]),
    sig(QueryOperator::Count, &[Source]),
    sig(QueryOperator::Count, &[Source, Predicate]),
    sig(QueryOperator::Any, &[Source]),
    sig(QueryOperator::Any, &[Source, Predicate]),
    sig(QueryOperator::FirstOrFallback, &[Source, Fallback]),
    sig(QueryOperator::FirstOrFallback, &[Source, Predicate, Fallback]),
];

static BY_ARITY: LazyLock<HashMap<(QueryOperator, usize), &'static OperatorSignature>> =
    LazyLock::new(|| {
        SIGNATURES
            .iter()
            .map(|sig| ((sig.operator, sig.arity()), sig))
            .collect()
    });

/// Resolve the overload of `operator` taking `arity` arguments.
pub fn resolve(operator: QueryOperator, arity: usize) -> Result<&'static OperatorSignature> {
    BY_ARITY
        .get(&(operator, arity))
        .copied()
        .ok_or(RewriteError::UnknownOverload { operator, arity })
}

/// Expand a `FirstOrFallback` call into the `First`/`Concat`/`Where` tree that defines it.
pub fn expand_first_or_fallback(call: &MethodCall) -> Result<Arc<Expr>> {
    if call.operator != QueryOperator::FirstOrFallback {
        return Err(RewriteError::MalformedHelper {
            operator: call.operator,
            reason: "not a FirstOrFallback call".into(),
        });
    }
    let sig = resolve(call.operator, call.args.len())?;

    let elem = call.ty.clone();
    let seq_ty = DataType::sequence(elem.clone());
    let type_args = vec![elem.clone()];

    let (source, fallback) = match sig.params {
        [Source, Fallback] => (call.args[0].clone(), call.args[1].clone()),
        [Source, Predicate, Fallback] => {
            let filtered = Expr::call(
                QueryOperator::Where,
                type_args.clone(),
                vec![call.args[0].clone(), call.args[1].clone()],
                seq_ty.clone(),
            )?;
            (filtered, call.args[2].clone())
        }
        _ => {
            return Err(RewriteError::MalformedHelper {
                operator: call.operator,
                reason: format!("unexpected parameter list {:?}", sig.params),
            })
        }
    };

    let singleton = Expr::new_array(vec![fallback], seq_ty.clone());
    let concat = Expr::call(
        QueryOperator::Concat,
        type_args.clone(),
        vec![source, singleton],
        seq_ty,
    )?;
    Expr::call(QueryOperator::First, type_args, vec![concat], elem)
}
