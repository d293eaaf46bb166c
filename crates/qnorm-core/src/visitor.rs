//! # Tree-Rewriting Visitors
//!
//! An [`ExprVisitor`] maps a tree to a new tree. Dispatch is an exhaustive match on the node
//! variant; each `visit_*` method defaults to passthrough, which rebuilds the node from its
//! recursively visited children. A visitor overrides only the variants whose shapes it cares
//! about and calls back into [`ExprVisitor::visit`] for operands, so rewrites compose at any
//! depth.
//!
//! ## Sharing
//!
//! Passthrough returns the original `Arc` when no child changed, so a visitor that matches
//! nothing allocates nothing and returns a tree pointer-equal to its input.

use crate::error::Result;
use crate::expr::{BinaryExpr, Constant, Expr, MethodCall, OpaqueExpr};
use std::sync::Arc;

/// A tree-to-tree transform.
pub trait ExprVisitor {
    /// Name used in logs and pipeline reports.
    fn name(&self) -> &str;

    /// Visit any node, dispatching on its variant.
    fn visit(&mut self, expr: &Arc<Expr>) -> Result<Arc<Expr>> {
        match expr.as_ref() {
            Expr::MethodCall(call) => self.visit_method_call(expr, call),
            Expr::Binary(binary) => self.visit_binary(expr, binary),
            Expr::Constant(constant) => self.visit_constant(expr, constant),
            Expr::Opaque(opaque) => self.visit_opaque(expr, opaque),
        }
    }

    fn visit_method_call(&mut self, expr: &Arc<Expr>, call: &MethodCall) -> Result<Arc<Expr>> {
        walk_method_call(self, expr, call)
    }

    fn visit_binary(&mut self, expr: &Arc<Expr>, binary: &BinaryExpr) -> Result<Arc<Expr>> {
        walk_binary(self, expr, binary)
    }

    fn visit_constant(&mut self, expr: &Arc<Expr>, _constant: &Constant) -> Result<Arc<Expr>> {
        Ok(expr.clone())
    }

    fn visit_opaque(&mut self, expr: &Arc<Expr>, opaque: &OpaqueExpr) -> Result<Arc<Expr>> {
        walk_opaque(self, expr, opaque)
    }

    /// Number of rewrites applied so far by this visitor instance.
    fn rewrite_count(&self) -> usize {
        0
    }
}

/// Visit each expression; `None` if every result is pointer-equal to its input.
pub fn visit_all<V: ExprVisitor + ?Sized>(
    visitor: &mut V,
    exprs: &[Arc<Expr>],
) -> Result<Option<Vec<Arc<Expr>>>> {
    let mut changed = false;
    let mut out = Vec::with_capacity(exprs.len());
    for e in exprs {
        let visited = visitor.visit(e)?;
        changed |= !Arc::ptr_eq(e, &visited);
        out.push(visited);
    }
    Ok(changed.then_some(out))
}

/// Passthrough for a method call: keep the operator, visit the arguments.
pub fn walk_method_call<V: ExprVisitor + ?Sized>(
    visitor: &mut V,
    expr: &Arc<Expr>,
    call: &MethodCall,
) -> Result<Arc<Expr>> {
    match visit_all(visitor, &call.args)? {
        None => Ok(expr.clone()),
        Some(args) => Ok(Arc::new(Expr::MethodCall(MethodCall {
            operator: call.operator,
            type_args: call.type_args.clone(),
            args,
            ty: call.ty.clone(),
        }))),
    }
}

/// Passthrough for a binary operation: keep the operator, visit both operands.
pub fn walk_binary<V: ExprVisitor + ?Sized>(
    visitor: &mut V,
    expr: &Arc<Expr>,
    binary: &BinaryExpr,
) -> Result<Arc<Expr>> {
    let left = visitor.visit(&binary.left)?;
    let right = visitor.visit(&binary.right)?;
    if Arc::ptr_eq(&left, &binary.left) && Arc::ptr_eq(&right, &binary.right) {
        return Ok(expr.clone());
    }
    Ok(Expr::binary(binary.op, left, right, binary.ty.clone()))
}

/// Passthrough for an opaque node: visit its children.
pub fn walk_opaque<V: ExprVisitor + ?Sized>(
    visitor: &mut V,
    expr: &Arc<Expr>,
    opaque: &OpaqueExpr,
) -> Result<Arc<Expr>> {
    match visit_all(visitor, &opaque.children)? {
        None => Ok(expr.clone()),
        Some(children) => Ok(Expr::opaque(opaque.kind.clone(), children, opaque.ty.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::BinaryOp;
    use crate::types::{DataType, Value};

    /// Replaces every integer constant `n` with `n + 1`.
    struct Increment {
        count: usize,
    }

    impl ExprVisitor for Increment {
        fn name(&self) -> &str {
            "Increment"
        }

        fn visit_constant(&mut self, expr: &Arc<Expr>, constant: &Constant) -> Result<Arc<Expr>> {
            match constant.value {
                Value::Int64(n) => {
                    self.count += 1;
                    Ok(Expr::constant(Value::Int64(n + 1), constant.ty.clone()))
                }
                _ => Ok(expr.clone()),
            }
        }

        fn rewrite_count(&self) -> usize {
            self.count
        }
    }

    struct Identity;

    impl ExprVisitor for Identity {
        fn name(&self) -> &str {
            "Identity"
        }
    }

    fn tree() -> Arc<Expr> {
        let x = Expr::parameter("x", DataType::Int64);
        let sum = Expr::binary(
            BinaryOp::Add,
            x,
            Expr::constant(Value::Int64(1), DataType::Int64),
            DataType::Int64,
        );
        Expr::lambda(
            vec!["x".into()],
            sum,
            DataType::function(vec![DataType::Int64], DataType::Int64),
        )
    }

    #[test]
    fn test_identity_preserves_pointer() {
        let input = tree();
        let output = Identity.visit(&input).unwrap();
        assert!(Arc::ptr_eq(&input, &output));
    }

    #[test]
    fn test_rewrite_reaches_nested_constant() {
        let input = tree();
        let mut v = Increment { count: 0 };
        let output = v.visit(&input).unwrap();
        assert_eq!(output.to_string(), "|x| (x + 2)");
        assert_eq!(v.rewrite_count(), 1);
        // Input is untouched.
        assert_eq!(input.to_string(), "|x| (x + 1)");
    }

    #[test]
    fn test_unchanged_sibling_is_shared() {
        let input = tree();
        let output = Increment { count: 0 }.visit(&input).unwrap();
        let (Expr::Opaque(before), Expr::Opaque(after)) = (input.as_ref(), output.as_ref()) else {
            panic!("Expected lambdas");
        };
        let (Expr::Binary(b0), Expr::Binary(b1)) =
            (before.children[0].as_ref(), after.children[0].as_ref())
        else {
            panic!("Expected binary bodies");
        };
        assert!(Arc::ptr_eq(&b0.left, &b1.left));
        assert!(!Arc::ptr_eq(&b0.right, &b1.right));
    }
}
