//! Directive lifecycle: define, initialize, execute per batch, destroy.

use super::context::ExecutorContext;
use super::row::Row;
use crate::core::arguments::Arguments;
use crate::core::symbol::SourceSpan;
use crate::core::usage::UsageSchema;
use crate::error::DirectiveError;
use tracing::debug;

/// A schema-declared row transformation.
pub trait Directive {
    /// Parameters this directive accepts. Independent of any recipe text.
    fn define(&self) -> UsageSchema;

    /// Read and validate the bound arguments. Runs once, before any row.
    fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveError>;

    /// Process one batch and return the rows passed downstream.
    fn execute(
        &mut self,
        rows: Vec<Row>,
        ctx: &mut ExecutorContext,
    ) -> Result<Vec<Row>, DirectiveError>;

    /// Release resources. Called exactly once by [`DirectiveInstance`].
    fn destroy(&mut self) {}
}

/// An initialized directive bound to one recipe occurrence.
///
/// `destroy` runs on [`close`](Self::close) or on drop, whichever comes
/// first, and never twice.
pub struct DirectiveInstance {
    name: String,
    span: SourceSpan,
    inner: Box<dyn Directive>,
    destroyed: bool,
}

impl DirectiveInstance {
    pub fn new(name: impl Into<String>, span: SourceSpan, inner: Box<dyn Directive>) -> Self {
        Self {
            name: name.into(),
            span,
            inner,
            destroyed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &SourceSpan {
        &self.span
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn define(&self) -> UsageSchema {
        self.inner.define()
    }

    pub fn initialize(&mut self, args: &Arguments) -> Result<(), DirectiveError> {
        if self.destroyed {
            return Err(DirectiveError::Initialization {
                directive: self.name.clone(),
                message: "directive has already been destroyed".to_string(),
            });
        }
        self.inner.initialize(args)
    }

    pub fn execute(
        &mut self,
        rows: Vec<Row>,
        ctx: &mut ExecutorContext,
    ) -> Result<Vec<Row>, DirectiveError> {
        if self.destroyed {
            return Err(DirectiveError::Execution {
                directive: self.name.clone(),
                column: String::new(),
                message: "directive has already been destroyed".to_string(),
            });
        }
        self.inner.execute(rows, ctx)
    }

    pub fn close(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.inner.destroy();
            debug!(directive = %self.name, "destroyed directive");
        }
    }
}

impl Drop for DirectiveInstance {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DirectiveInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveInstance")
            .field("name", &self.name)
            .field("span", &self.span)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
