//! # Built-in Rewrite Rules
//!
//! This crate provides the default-value normalization that lets a query tree written for a
//! remote translator run in memory with the same results. All four rules live in one visitor,
//! [`DefaultValueRewriter`](default_value::DefaultValueRewriter), and each rule has its own
//! module:
//!
//! - **`default_if_empty`**: `DefaultIfEmpty(seq)` gets an explicit `default(T)` fallback.
//! - **`first_or_default`**: `FirstOrDefault(seq[, pred])` becomes the `FirstOrFallback`
//!   helper with an explicit `default(T)`.
//! - **`coalesce`**: `left ?? dynamic` gets a terminal `?? default(T)`.
//! - **`optional_compare`**: `opt == null` compares against a concrete empty wrapper instead.

mod coalesce;
mod default_if_empty;
pub mod default_value;
mod first_or_default;
mod optional_compare;

use qnorm_core::capability::TypeCapabilities;
use qnorm_core::pipeline::RewritePipeline;
use std::sync::Arc;

pub use default_value::{
    DefaultValueOptions, DefaultValueRewriter, DefaultValueRewriterFactory, RewriteStats,
};

/// Create the standard pipeline: a single default-value stage.
///
/// Further stages can be added to the returned pipeline with `add_factory()`.
pub fn default_pipeline(capabilities: Arc<dyn TypeCapabilities>) -> RewritePipeline {
    let mut pipeline = RewritePipeline::new();
    pipeline.add_factory(Box::new(DefaultValueRewriterFactory::new(capabilities)));
    pipeline
}
