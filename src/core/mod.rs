//! Recipe front end: lexing, parsing, compilation, binding and run configuration.

pub mod arguments;
pub mod compiler;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod symbol;
pub mod syntax;
pub mod token;
pub mod usage;
