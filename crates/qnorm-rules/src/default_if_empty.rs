//! # Default-If-Empty Normalization
//!
//! ```text
//! Before: DefaultIfEmpty<T>(seq)
//! After:  DefaultIfEmpty<T>(seq', default(T))
//! ```
//!
//! On an empty sequence the translator yields a zero-valued `T`, while the in-memory evaluator
//! yields `[null]`. Passing the default explicitly makes both produce `[default(T)]`.
//! Non-empty sequences are unaffected.
//!
//! Gated on `T` supporting zero-argument construction.

use crate::default_value::DefaultValueRewriter;
use qnorm_core::error::Result;
use qnorm_core::expr::{Expr, MethodCall, QueryOperator};
use qnorm_core::signature;
use qnorm_core::visitor::{walk_method_call, ExprVisitor};
use std::sync::Arc;
use tracing::trace;

const RULE: &str = "DefaultIfEmpty";

pub(crate) fn rewrite(
    v: &mut DefaultValueRewriter,
    expr: &Arc<Expr>,
    call: &MethodCall,
) -> Result<Arc<Expr>> {
    let Some(elem) = call.element_type().cloned() else {
        return walk_method_call(v, expr, call);
    };
    let Some(default) = v.default_instance(RULE, &elem)? else {
        return walk_method_call(v, expr, call);
    };
    signature::resolve(QueryOperator::DefaultIfEmpty, 2)?;

    let source = v.visit(&call.args[0])?;
    trace!("{}: supplying explicit default for `{}`", RULE, elem);
    v.stats.default_if_empty += 1;

    Expr::call(
        QueryOperator::DefaultIfEmpty,
        call.type_args.clone(),
        vec![source, Expr::constant(default, elem)],
        call.ty.clone(),
    )
}
