//! # qnorm-core: Query Expression Trees and Rewrite Pipeline
//!
//! This crate holds the data structures that query-tree rewriters share: the immutable
//! expression tree, its static types, the type-capability queries rewriters are gated on,
//! the operator signature tables, the visitor trait and the pipeline that sequences visitors.
//! The rewriting rules themselves live in `qnorm-rules`.
//!
//! ## Module Overview
//!
//! - **`expr`**: The query expression tree (method calls, binary operations, constants and
//!   opaque nodes) with `Arc`-shared children.
//! - **`types`**: Static types (`DataType`) and constant values (`Value`).
//! - **`capability`**: The `TypeCapabilities` trait and the explicit `TypeRegistry` provider.
//! - **`signature`**: Lazily-built overload table keyed by operator and arity, plus the
//!   expansion of the `FirstOrFallback` helper.
//! - **`visitor`**: The `ExprVisitor` trait and passthrough traversal.
//! - **`pipeline`**: `RewritePipeline`, which applies visitor factories in order.
//! - **`error`**: `RewriteError` and the crate `Result` alias.

pub mod capability;
pub mod error;
pub mod expr;
pub mod pipeline;
pub mod signature;
pub mod types;
pub mod visitor;

pub use error::{Result, RewriteError};
