//! # Default-Value Rewriter
//!
//! A query tree can be handed either to a remote translator or to an in-memory sequence
//! evaluator. The two disagree about what "nothing" means:
//!
//! - The translator materializes an empty fallback as a zero-valued record; the in-memory
//!   evaluator yields the absent sentinel.
//! - A dynamic `??` fallback that is itself absent stays absent in memory.
//! - Comparing an optional-wrapper against a raw null literal is structural in memory, so it
//!   never matches an empty wrapper.
//!
//! This visitor removes those differences by making every fallback explicit. It recognizes
//! four shapes, one rule module each:
//!
//! | shape                                   | module               |
//! |-----------------------------------------|----------------------|
//! | `DefaultIfEmpty(seq)`                   | `default_if_empty`   |
//! | `FirstOrDefault(seq[, pred])`           | `first_or_default`   |
//! | `left ?? right`                         | `coalesce`           |
//! | `opt == null` / `opt != null`           | `optional_compare`   |
//!
//! Every rule is gated on the relevant type supporting zero-argument construction. A gated
//! or disabled rule falls back to passthrough, so the node's children are still rewritten.

use crate::{coalesce, default_if_empty, first_or_default, optional_compare};
use qnorm_core::capability::TypeCapabilities;
use qnorm_core::error::Result;
use qnorm_core::expr::{BinaryExpr, BinaryOp, Expr, MethodCall, QueryOperator};
use qnorm_core::pipeline::VisitorFactory;
use qnorm_core::types::{DataType, Value};
use qnorm_core::visitor::{walk_binary, walk_method_call, ExprVisitor};
use std::sync::Arc;
use tracing::trace;

/// Per-rule switches. All rules are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultValueOptions {
    pub default_if_empty: bool,
    pub first_or_default: bool,
    pub coalesce: bool,
    pub optional_compare: bool,
}

impl Default for DefaultValueOptions {
    fn default() -> Self {
        Self {
            default_if_empty: true,
            first_or_default: true,
            coalesce: true,
            optional_compare: true,
        }
    }
}

/// How many times each rule fired during one visit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub default_if_empty: usize,
    pub first_or_default: usize,
    pub coalesce: usize,
    pub optional_compare: usize,
}

impl RewriteStats {
    pub fn total(&self) -> usize {
        self.default_if_empty + self.first_or_default + self.coalesce + self.optional_compare
    }
}

/// Visitor that makes default-value fallbacks explicit.
pub struct DefaultValueRewriter {
    pub(crate) capabilities: Arc<dyn TypeCapabilities>,
    pub(crate) options: DefaultValueOptions,
    pub(crate) stats: RewriteStats,
}

impl DefaultValueRewriter {
    pub const NAME: &'static str = "DefaultValue";

    pub fn new(capabilities: Arc<dyn TypeCapabilities>) -> Self {
        Self::with_options(capabilities, DefaultValueOptions::default())
    }

    pub fn with_options(
        capabilities: Arc<dyn TypeCapabilities>,
        options: DefaultValueOptions,
    ) -> Self {
        Self {
            capabilities,
            options,
            stats: RewriteStats::default(),
        }
    }

    pub fn stats(&self) -> RewriteStats {
        self.stats
    }

    /// The default instance of `ty`, or `None` when `ty` has no zero-argument constructor.
    ///
    /// Resolution failures on a type that claims a constructor are errors, not skips.
    pub(crate) fn default_instance(&self, rule: &str, ty: &DataType) -> Result<Option<Value>> {
        if !self.capabilities.has_default_constructor(ty) {
            trace!("{}: skipping, `{}` has no zero-argument constructor", rule, ty);
            return Ok(None);
        }
        self.capabilities.construct_default(ty).map(Some)
    }
}

impl ExprVisitor for DefaultValueRewriter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn visit_method_call(&mut self, expr: &Arc<Expr>, call: &MethodCall) -> Result<Arc<Expr>> {
        match (call.operator, call.args.len()) {
            (QueryOperator::DefaultIfEmpty, 1) if self.options.default_if_empty => {
                default_if_empty::rewrite(self, expr, call)
            }
            (QueryOperator::FirstOrDefault, 1 | 2) if self.options.first_or_default => {
                first_or_default::rewrite(self, expr, call)
            }
            _ => walk_method_call(self, expr, call),
        }
    }

    fn visit_binary(&mut self, expr: &Arc<Expr>, binary: &BinaryExpr) -> Result<Arc<Expr>> {
        match binary.op {
            BinaryOp::Coalesce if self.options.coalesce => coalesce::rewrite(self, expr, binary),
            BinaryOp::Equal | BinaryOp::NotEqual if self.options.optional_compare => {
                optional_compare::rewrite(self, expr, binary)
            }
            _ => walk_binary(self, expr, binary),
        }
    }

    fn rewrite_count(&self) -> usize {
        self.stats.total()
    }
}

/// Pipeline stage that creates a fresh [`DefaultValueRewriter`] per rewrite.
pub struct DefaultValueRewriterFactory {
    capabilities: Arc<dyn TypeCapabilities>,
    options: DefaultValueOptions,
}

impl DefaultValueRewriterFactory {
    pub fn new(capabilities: Arc<dyn TypeCapabilities>) -> Self {
        Self::with_options(capabilities, DefaultValueOptions::default())
    }

    pub fn with_options(
        capabilities: Arc<dyn TypeCapabilities>,
        options: DefaultValueOptions,
    ) -> Self {
        Self {
            capabilities,
            options,
        }
    }
}

impl VisitorFactory for DefaultValueRewriterFactory {
    fn name(&self) -> &str {
        DefaultValueRewriter::NAME
    }

    fn create(&self) -> Box<dyn ExprVisitor> {
        Box::new(DefaultValueRewriter::with_options(
            self.capabilities.clone(),
            self.options,
        ))
    }
}
