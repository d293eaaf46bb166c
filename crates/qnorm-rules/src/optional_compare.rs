//! # Optional-Null Comparison Normalization
//!
//! ```text
//! Before: opt == null            null != opt
//! After:  opt' == W(default(T))  W(default(T)) != opt'
//!         where opt : W<T>
//! ```
//!
//! The in-memory evaluator compares optional-wrappers structurally, so a raw null literal never
//! equals an empty wrapper. Replacing the literal with the concrete empty wrapper of the same
//! type, built by passing `default(T)` through the wrapper's non-nullary constructor, makes both
//! evaluators agree.
//!
//! Gated on the wrapper family being registered and on `T` supporting zero-argument
//! construction. A wrapper family with zero or several non-nullary constructors is a
//! registration conflict and fails the rewrite.

use crate::default_value::DefaultValueRewriter;
use qnorm_core::error::Result;
use qnorm_core::expr::{BinaryExpr, Expr};
use qnorm_core::types::DataType;
use qnorm_core::visitor::{walk_binary, ExprVisitor};
use std::sync::Arc;
use tracing::trace;

const RULE: &str = "OptionalCompare";

/// Which operand holds the null literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullSide {
    Left,
    Right,
}

pub(crate) fn rewrite(
    v: &mut DefaultValueRewriter,
    expr: &Arc<Expr>,
    binary: &BinaryExpr,
) -> Result<Arc<Expr>> {
    let Some((side, wrapper_ty, inner)) = match_shape(v, binary) else {
        return walk_binary(v, expr, binary);
    };
    let Some(inner_default) = v.default_instance(RULE, &inner)? else {
        return walk_binary(v, expr, binary);
    };
    let empty = v
        .capabilities
        .construct_optional_wrapper(&wrapper_ty, inner_default)?;
    let empty = Expr::constant(empty, wrapper_ty.clone());

    let (left, right) = match side {
        NullSide::Right => (v.visit(&binary.left)?, empty),
        NullSide::Left => (empty, v.visit(&binary.right)?),
    };
    trace!("{}: replacing null literal with empty `{}`", RULE, wrapper_ty);
    v.stats.optional_compare += 1;

    Ok(Expr::binary(binary.op, left, right, binary.ty.clone()))
}

/// Find an optional-wrapper operand compared against a null literal.
fn match_shape(
    v: &DefaultValueRewriter,
    binary: &BinaryExpr,
) -> Option<(NullSide, DataType, DataType)> {
    let candidates = [
        (NullSide::Right, &binary.left, &binary.right),
        (NullSide::Left, &binary.right, &binary.left),
    ];
    candidates.into_iter().find_map(|(side, operand, literal)| {
        if !literal.is_null_literal() || operand.is_null_literal() {
            return None;
        }
        let wrapper_ty = operand.static_type();
        v.capabilities
            .is_optional_wrapper(wrapper_ty)
            .map(|inner| (side, wrapper_ty.clone(), inner))
    })
}
