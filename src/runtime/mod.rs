//! Directive execution runtime: rows, context, lifecycle and pipeline.

pub mod context;
pub mod directive;
pub mod pipeline;
pub mod registry;
pub mod row;

pub use context::{ExecutorContext, Scope, ScopedStore, TransientStore};
pub use directive::{Directive, DirectiveInstance};
pub use pipeline::{execute_recipe, RecipePipeline};
pub use registry::{DirectiveFactory, DirectiveRegistry};
pub use row::{Row, Value};
