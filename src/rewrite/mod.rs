//! The rewrite pipeline: ten ordered passes over a file's syntax tree.
//!
//! Pass order is not commutative. Expectation roots are normalized first,
//! fluent chains are converted while the legacy extension methods still
//! bind, mock construction changes the declared types, and only then can
//! `.Object` insertion and using-directive removal run.
//!
//! Passes are stateless values; everything per-file travels in
//! [`PassContext`]. Strategies inside passes return a tagged [`Rewrite`]
//! outcome instead of erroring: `Skip` always means "leave the original
//! node in place".

pub mod argument;
pub mod chain;
pub mod expect_call;
pub mod factory;
pub mod format;
pub mod instantiation;
pub mod mock_setup;
pub mod object_ref;
pub mod obsolete;
pub mod ordered;
pub mod pipeline;
pub mod usings;
pub mod verify;

use crate::catalog::{MoqSymbols, RhinoSymbols};
use crate::diag::DiagnosticSink;
use crate::sema::SemanticModel;
use crate::syntax::ast::CompilationUnit;
use crate::syntax::NodeTracker;

/// Everything a pass needs for one application to one file.
pub struct PassContext<'a> {
    pub model: &'a SemanticModel<'a>,
    pub tracker: &'a NodeTracker,
    pub rhino: &'a RhinoSymbols,
    pub moq: &'a MoqSymbols,
    pub diags: &'a DiagnosticSink,
    pub file: &'a str,
}

impl PassContext<'_> {
    pub fn warn(&self, line: u32, message: impl Into<String>) {
        self.diags.warn(self.file, line, message);
    }
}

/// Outcome of one strategy applied to one node.
#[derive(Debug)]
pub enum Rewrite<T> {
    Done(T),
    /// Leave the original node untouched.
    Skip,
}

impl<T> Rewrite<T> {
    pub fn done(self) -> Option<T> {
        match self {
            Rewrite::Done(v) => Some(v),
            Rewrite::Skip => None,
        }
    }
}

pub trait RewritePass {
    fn name(&self) -> &'static str;
    fn rewrite(&self, unit: &mut CompilationUnit, ctx: &PassContext<'_>);
}

/// The fixed pass order.
pub fn passes() -> Vec<Box<dyn RewritePass>> {
    vec![
        Box::new(expect_call::ExpectCallPass),
        Box::new(usings::MoqUsingDirectivePass),
        Box::new(mock_setup::MockSetupPass),
        Box::new(verify::VerifyPass),
        Box::new(instantiation::MockInstantiationPass),
        Box::new(ordered::OrderedMockPass),
        Box::new(argument::ArgumentMatcherPass),
        Box::new(obsolete::ObsoleteCallPass),
        Box::new(object_ref::MockObjectPass),
        Box::new(usings::RhinoUsingDirectivePass),
    ]
}
