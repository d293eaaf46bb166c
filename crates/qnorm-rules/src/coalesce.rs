//! # Coalesce Default-Termination
//!
//! ```text
//! Before: left ?? right
//! After:  (left' ?? right') ?? default(T)
//! ```
//!
//! When `right` is a dynamic expression it can itself evaluate to absence, and the two
//! evaluators then disagree on the result. Appending a concrete `default(T)` guarantees the
//! whole expression never evaluates to absence. A literal `right` already is concrete, so
//! that shape is only traversed.
//!
//! Gated on the result type `T` supporting zero-argument construction.

use crate::default_value::DefaultValueRewriter;
use qnorm_core::error::Result;
use qnorm_core::expr::{BinaryExpr, BinaryOp, Expr};
use qnorm_core::visitor::{walk_binary, ExprVisitor};
use std::sync::Arc;
use tracing::trace;

const RULE: &str = "Coalesce";

pub(crate) fn rewrite(
    v: &mut DefaultValueRewriter,
    expr: &Arc<Expr>,
    binary: &BinaryExpr,
) -> Result<Arc<Expr>> {
    if binary.right.as_constant().is_some() {
        return walk_binary(v, expr, binary);
    }
    let Some(default) = v.default_instance(RULE, &binary.ty)? else {
        return walk_binary(v, expr, binary);
    };

    let left = v.visit(&binary.left)?;
    let right = v.visit(&binary.right)?;
    trace!("{}: terminating `{}` with its default", RULE, binary.ty);
    v.stats.coalesce += 1;

    let inner = Expr::binary(BinaryOp::Coalesce, left, right, binary.ty.clone());
    Ok(Expr::binary(
        BinaryOp::Coalesce,
        inner,
        Expr::constant(default, binary.ty.clone()),
        binary.ty.clone(),
    ))
}
