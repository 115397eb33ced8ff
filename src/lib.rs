//! Wrangle: a recipe compiler and directive runtime for row-oriented data
//! preparation.
//!
//! Recipes are compiled into a symbol table of token groups, each group is
//! bound against the directive's declared usage, and the resulting
//! pipeline is driven batch by batch. Byte-size and time-duration values
//! are first-class tokens with exact unit conversion.

pub mod cli;
pub mod core;
pub mod directives;
pub mod error;
pub mod runtime;
pub mod units;

pub use crate::core::compiler::compile;
pub use crate::core::config::RunConfig;
pub use crate::error::{RecipeError, Result};
pub use crate::runtime::{execute_recipe, DirectiveRegistry, RecipePipeline, Row, Value};
pub use crate::units::{ByteSize, ByteUnit, TimeDuration, TimeUnit};
