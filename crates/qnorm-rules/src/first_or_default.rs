//! # First-Or-Default Normalization
//!
//! ```text
//! Before: FirstOrDefault<T>(seq)          FirstOrDefault<T>(seq, pred)
//! After:  FirstOrFallback<T>(seq', d)     FirstOrFallback<T>(seq', pred', d)
//!                                         where d = default(T)
//! ```
//!
//! `FirstOrFallback` is the canonical helper defined in `qnorm_core::signature`: the first
//! element of the (filtered) source followed by `[d]`. The fallback is appended after
//! filtering and is never tested against the predicate.
//!
//! Gated on `T` supporting zero-argument construction.

use crate::default_value::DefaultValueRewriter;
use qnorm_core::error::Result;
use qnorm_core::expr::{Expr, MethodCall, QueryOperator};
use qnorm_core::signature;
use qnorm_core::visitor::{walk_method_call, ExprVisitor};
use std::sync::Arc;
use tracing::trace;

const RULE: &str = "FirstOrDefault";

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
    signature::resolve(QueryOperator::FirstOrFallback, call.args.len() + 1)?;

    let mut args = call
        .args
        .iter()
        .map(|a| v.visit(a))
        .collect::<Result<Vec<_>>>()?;
    args.push(Expr::constant(default, elem.clone()));

    trace!(
        "{}: routing {}-argument call through FirstOrFallback for `{}`",
        RULE,
        call.args.len(),
        elem
    );
    v.stats.first_or_default += 1;

    Expr::call(
        QueryOperator::FirstOrFallback,
        call.type_args.clone(),
        args,
        call.ty.clone(),
    )
}
