//! CLI subcommands: inspect, validate, run, directives.

use crate::core::compiler;
use crate::core::config::{self, RunConfig};
use crate::runtime::{DirectiveRegistry, RecipePipeline, Row};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a recipe and print its symbol table as JSON
    Inspect {
        /// Path to the recipe file
        recipe: PathBuf,
    },

    /// Compile, bind and initialize every directive in a recipe
    Validate {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Path to wrangle.yaml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Stream JSON-lines rows through a recipe
    Run {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Input rows, one JSON object per line
        #[arg(short, long)]
        input: PathBuf,

        /// Path to wrangle.yaml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Rows per batch (overrides the config file)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// List registered directives and their usage
    Directives,
}

/// Install the stderr fmt subscriber. `RUST_LOG` wins over `verbose`.
///
/// Returns `false` when a global subscriber was already installed; that
/// one stays in place.
pub fn init_logging(verbose: bool) -> bool {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "keeping existing tracing subscriber");
            false
        }
    }
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Inspect { recipe } => cmd_inspect(&recipe),
        Commands::Validate { recipe, config } => cmd_validate(&recipe, config.as_deref()),
        Commands::Run {
            recipe,
            input,
            config,
            batch_size,
        } => cmd_run(&recipe, &input, config.as_deref(), batch_size),
        Commands::Directives => cmd_directives(),
    }
}

fn read_recipe(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
}

/// Load and validate the run configuration. No path means defaults.
fn load_config(path: Option<&Path>) -> Result<RunConfig, String> {
    let config = match path {
        Some(path) => config::parse_config_file(path)?,
        None => RunConfig::default(),
    };
    let errors = config::validate_config(&config);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        return Err(format!("{} config error(s)", errors.len()));
    }
    Ok(config)
}

fn cmd_inspect(recipe: &Path) -> Result<(), String> {
    let source = read_recipe(recipe)?;
    let table = compiler::compile(&source).map_err(|e| format!("{}: {}", recipe.display(), e))?;
    let json = serde_json::to_string_pretty(&table.to_json()).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn cmd_validate(recipe: &Path, config: Option<&Path>) -> Result<(), String> {
    let config = load_config(config)?;
    let source = read_recipe(recipe)?;
    let registry = DirectiveRegistry::with_builtins();
    let mut pipeline = RecipePipeline::compile(&source, &registry, &config)
        .map_err(|e| format!("{}: {}", recipe.display(), e))?;
    println!(
        "OK: {} ({} directive(s))",
        recipe.display(),
        pipeline.len()
    );
    pipeline.close();
    Ok(())
}

/// Parse JSON-lines input. Blank lines are skipped.
fn read_rows(path: &Path) -> Result<Vec<Row>, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let mut rows = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: invalid JSON: {}", path.display(), i + 1, e))?;
        let row = Row::from_json(&json).map_err(|e| format!("{}:{}: {}", path.display(), i + 1, e))?;
        rows.push(row);
    }
    Ok(rows)
}

fn into_batches(rows: Vec<Row>, batch_size: usize) -> Vec<Vec<Row>> {
    let mut batches = Vec::new();
    let mut current = Vec::with_capacity(batch_size);
    for row in rows {
        current.push(row);
        if current.len() == batch_size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Compile `recipe` and push every row of `input` through it.
fn run_rows(
    recipe: &Path,
    input: &Path,
    config: Option<&Path>,
    batch_size: Option<usize>,
) -> Result<Vec<Row>, String> {
    let mut config = load_config(config)?;
    if let Some(size) = batch_size {
        if size == 0 {
            return Err("--batch-size must be greater than 0".to_string());
        }
        config.batch_size = size;
    }
    let source = read_recipe(recipe)?;
    let rows = read_rows(input)?;
    let registry = DirectiveRegistry::with_builtins();
    let mut pipeline = RecipePipeline::compile(&source, &registry, &config)
        .map_err(|e| format!("{}: {}", recipe.display(), e))?;

    let batches = into_batches(rows, config.batch_size);
    debug!(batches = batches.len(), batch_size = config.batch_size, "streaming input");
    let output = pipeline.run(batches).map_err(|e| e.to_string())?;
    pipeline.close();
    Ok(output)
}

fn cmd_run(
    recipe: &Path,
    input: &Path,
    config: Option<&Path>,
    batch_size: Option<usize>,
) -> Result<(), String> {
    for row in run_rows(recipe, input, config, batch_size)? {
        println!("{}", row.to_json());
    }
    Ok(())
}

fn cmd_directives() -> Result<(), String> {
    let registry = DirectiveRegistry::with_builtins();
    for name in registry.names() {
        if let Some(schema) = registry.usage(name) {
            println!("{}", schema.usage());
        }
    }
    Ok(())
}
