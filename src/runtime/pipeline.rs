//! Recipe pipeline: compile, bind, initialize, then drive batches.
//!
//! compile → symbol table → per token group: lookup → define → bind →
//! initialize → execute per batch in recipe order → destroy

use super::context::ExecutorContext;
use super::directive::DirectiveInstance;
use super::registry::DirectiveRegistry;
use super::row::Row;
use crate::core::arguments::Arguments;
use crate::core::compiler;
use crate::core::config::{Environment, RunConfig};
use crate::core::symbol::RecipeSymbolTable;
use crate::error::{BindError, RecipeError, Result};
use tracing::{debug, info};

pub struct RecipePipeline {
    table: RecipeSymbolTable,
    directives: Vec<DirectiveInstance>,
    environment: Environment,
    context: ExecutorContext,
}

impl RecipePipeline {
    /// Compile recipe text and initialize every directive it names.
    pub fn compile(recipe: &str, registry: &DirectiveRegistry, config: &RunConfig) -> Result<Self> {
        let table = compiler::compile(recipe)?;
        Self::from_symbol_table(table, registry, config)
    }

    pub fn from_symbol_table(
        table: RecipeSymbolTable,
        registry: &DirectiveRegistry,
        config: &RunConfig,
    ) -> Result<Self> {
        if let (Some(expected), Some(found)) = (&config.grammar_version, table.version()) {
            if expected.trim() != found {
                return Err(RecipeError::VersionMismatch {
                    expected: expected.clone(),
                    found: found.to_string(),
                });
            }
        }

        for name in table.loadable_directives() {
            if !registry.contains(name) {
                return Err(RecipeError::UnknownLoadableDirective(name.to_string()));
            }
        }

        let mut directives = Vec::with_capacity(table.len());
        for group in table.token_groups() {
            let name = group
                .directive_name()
                .ok_or_else(|| BindError::MissingDirectiveName {
                    span: group.span().clone(),
                })?;
            let inner = registry
                .create(name)
                .ok_or_else(|| RecipeError::UnknownDirective {
                    name: name.to_string(),
                    span: group.span().clone(),
                })?;
            // Wrap first: a failed bind or initialize still destroys on drop.
            let mut directive = DirectiveInstance::new(name, group.span().clone(), inner);
            let schema = directive.define();
            let args = Arguments::bind(&schema, group)?;
            directive.initialize(&args)?;
            debug!(directive = name, line = group.span().start_line, "initialized directive");
            directives.push(directive);
        }

        info!(
            directives = directives.len(),
            environment = %config.environment,
            "recipe pipeline ready"
        );
        Ok(Self {
            table,
            directives,
            environment: config.environment,
            context: ExecutorContext::new(config.environment),
        })
    }

    pub fn symbol_table(&self) -> &RecipeSymbolTable {
        &self.table
    }

    pub fn context(&self) -> &ExecutorContext {
        &self.context
    }

    pub fn directives(&self) -> &[DirectiveInstance] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Thread one batch through every directive in recipe order.
    ///
    /// Once a batch has been marked final, later batches of the same run
    /// are final too.
    pub fn execute_batch(&mut self, rows: Vec<Row>, is_final: bool) -> Result<Vec<Row>> {
        self.context.begin_batch(is_final);
        let batch = self.context.batches();
        debug!(
            batch,
            rows = rows.len(),
            is_final = self.context.is_final_batch(),
            "executing batch"
        );

        let mut rows = rows;
        for (index, directive) in self.directives.iter_mut().enumerate() {
            self.context.enter(index);
            match directive.execute(rows, &mut self.context) {
                Ok(next) => rows = next,
                Err(e) => {
                    self.context.end_batch();
                    return Err(e.into());
                }
            }
        }
        self.context.end_batch();

        if self.context.is_final_batch() {
            info!(batches = batch, rows = rows.len(), "final batch complete");
        }
        Ok(rows)
    }

    /// Discard the run context: final flag, batch count and every stored
    /// value. Directives stay initialized.
    pub fn begin_run(&mut self) {
        self.context = ExecutorContext::new(self.environment);
    }

    /// Execute one complete run: a fresh context, `batches` fed in order
    /// with the last one marked final, all output rows collected. An empty
    /// input still executes one empty final batch.
    pub fn run<I>(&mut self, batches: I) -> Result<Vec<Row>>
    where
        I: IntoIterator<Item = Vec<Row>>,
    {
        self.begin_run();
        let mut batches = batches.into_iter().peekable();
        let mut output = Vec::new();
        if batches.peek().is_none() {
            output.extend(self.execute_batch(Vec::new(), true)?);
            return Ok(output);
        }
        while let Some(batch) = batches.next() {
            let is_final = batches.peek().is_none();
            output.extend(self.execute_batch(batch, is_final)?);
        }
        Ok(output)
    }

    /// Destroy every directive. Also happens on drop.
    pub fn close(&mut self) {
        for directive in &mut self.directives {
            directive.close();
        }
    }
}

impl std::fmt::Debug for RecipePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipePipeline")
            .field("directives", &self.directives)
            .field("context", &self.context)
            .finish()
    }
}

/// Compile `recipe` against the built-in registry in the testing
/// environment and run `rows` as a single final batch.
pub fn execute_recipe(recipe: &str, rows: Vec<Row>) -> Result<Vec<Row>> {
    let registry = DirectiveRegistry::with_builtins();
    let mut pipeline = RecipePipeline::compile(recipe, &registry, &RunConfig::testing())?;
    let output = pipeline.execute_batch(rows, true)?;
    pipeline.close();
    Ok(output)
}
