//! # Rewrite Pipeline
//!
//! The pipeline owns an ordered list of visitor factories. A rewrite runs each stage once, in
//! order, feeding the tree produced by one stage into the next.
//!
//! ## Fresh Visitors Per Call
//!
//! Factories, not visitors, are stored. Every call to [`RewritePipeline::rewrite`] creates a
//! new visitor per stage, so visitors may keep per-call state (rewrite counters) while the
//! pipeline itself stays immutable and can be shared across threads behind an `Arc`.
//!
//! ## Failure
//!
//! The pipeline adds no failure modes. The first stage error aborts the whole rewrite and is
//! returned unchanged; no partial tree is produced.

use crate::error::Result;
use crate::expr::Expr;
use crate::visitor::ExprVisitor;
use std::sync::Arc;
use tracing::debug;

/// Creates one visitor per rewrite invocation.
pub trait VisitorFactory: Send + Sync {
    /// Name of the stage, used for lookup, logging and reports.
    fn name(&self) -> &str;

    /// Build a fresh visitor.
    fn create(&self) -> Box<dyn ExprVisitor>;
}

/// Adapts a closure into a [`VisitorFactory`].
pub struct FnVisitorFactory<F> {
    name: String,
    make: F,
}

impl<F> FnVisitorFactory<F>
where
    F: Fn() -> Box<dyn ExprVisitor> + Send + Sync,
{
    pub fn new(name: impl Into<String>, make: F) -> Self {
        Self {
            name: name.into(),
            make,
        }
    }
}

impl<F> VisitorFactory for FnVisitorFactory<F>
where
    F: Fn() -> Box<dyn ExprVisitor> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Box<dyn ExprVisitor> {
        (self.make)()
    }
}

/// Pipeline-level settings.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Keep a rendering of the tree before and after every stage in the report.
    pub record_trace: bool,
}

/// Outcome of one stage of a reported rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub visitor: String,
    pub rewrites: usize,
    /// Tree before the stage; only filled when `record_trace` is set.
    pub before: Option<String>,
    /// Tree after the stage; only filled when `record_trace` is set.
    pub after: Option<String>,
}

/// Final tree plus per-stage details.
#[derive(Debug, Clone)]
pub struct RewriteReport {
    pub tree: Arc<Expr>,
    pub stages: Vec<StageReport>,
}

impl RewriteReport {
    pub fn total_rewrites(&self) -> usize {
        self.stages.iter().map(|s| s.rewrites).sum()
    }
}

/// Ordered sequence of rewrite stages.
#[derive(Default)]
pub struct RewritePipeline {
    factories: Vec<Box<dyn VisitorFactory>>,
    config: PipelineConfig,
}

impl RewritePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            factories: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Append a stage.
    pub fn add_factory(&mut self, factory: Box<dyn VisitorFactory>) {
        self.factories.push(factory);
    }

    /// Insert a stage at `index`, shifting later stages back.
    ///
    /// Panics if `index > len`, like `Vec::insert`.
    pub fn insert_factory(&mut self, index: usize, factory: Box<dyn VisitorFactory>) {
        self.factories.insert(index, factory);
    }

    /// Remove the first stage called `name`. Returns whether one was removed.
    pub fn remove_factory(&mut self, name: &str) -> bool {
        match self.factories.iter().position(|f| f.name() == name) {
            Some(index) => {
                self.factories.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Run every stage over `tree` and return the final tree.
    pub fn rewrite(&self, tree: &Arc<Expr>) -> Result<Arc<Expr>> {
        Ok(self.run(tree, false)?.tree)
    }

    /// Like [`rewrite`](Self::rewrite), but also report what each stage did.
    pub fn rewrite_with_report(&self, tree: &Arc<Expr>) -> Result<RewriteReport> {
        self.run(tree, self.config.record_trace)
    }

    fn run(&self, tree: &Arc<Expr>, record_trace: bool) -> Result<RewriteReport> {
        debug!(
            "Starting rewrite: stages={}, nodes={}",
            self.factories.len(),
            tree.node_count()
        );

        let mut current = tree.clone();
        let mut stages = Vec::with_capacity(self.factories.len());

        for factory in &self.factories {
            let mut visitor = factory.create();
            let before = record_trace.then(|| current.to_string());

            debug!("Running rewrite stage '{}'", factory.name());
            current = visitor.visit(&current)?;

            let rewrites = visitor.rewrite_count();
            debug!(
                "Stage '{}' finished: rewrites={}",
                factory.name(),
                rewrites
            );
            stages.push(StageReport {
                visitor: factory.name().to_string(),
                rewrites,
                before,
                after: record_trace.then(|| current.to_string()),
            });
        }

        let report = RewriteReport {
            tree: current,
            stages,
        };
        debug!("Rewrite complete: rewrites={}", report.total_rewrites());
        Ok(report)
    }
}
